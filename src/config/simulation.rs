//! Intervention simulation configuration

use serde::{Deserialize, Serialize};

use super::scoring::{GridHcsWeights, SCORING};

/// Settings for the zone-scoped (tract table) simulator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZoneSimulationSettings {
    /// Point actions are buffered by this many linear units before the zone intersection test
    pub point_buffer: f64,
    /// Half-width of the estimated HCS delta range, as a fraction of the point estimate
    pub estimate_uncertainty: f64,
    /// Nominal reach reported for a new facility
    pub facility_impact_radius: f64,
    /// Vegetation change that corresponds to one `factor` unit of temperature response
    pub vegetation_reference_delta: f64,
}

/// Confidence reported by the aggregate simulation: `min(cap, base + per_zone * affected)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceSettings {
    pub base: f64,
    pub per_zone: f64,
    pub cap: f64,
}

/// Parameters of the grid-scoped (park placement) simulator.
///
/// Distances are in the linear unit of `pixel_size` (metres for the demo city).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSimulationParams {
    pub pixel_size: f64,
    pub service_radius: f64,
    /// Peak cooling at a new cell with full need
    pub max_cooling: f64,
    pub heat_decay_radius: f64,
    /// Peak fractional pollutant reduction at a new cell with full need
    pub max_reduction_fraction: f64,
    pub pollutant_decay_radius: f64,
    /// Fixed maintenance cost per intervention
    pub lambda_m: f64,
    /// Multiplier on mean coverage gain (overlap cost)
    pub lambda_o: f64,
    /// Lower clamp of the per-cell temperature delta
    pub temperature_floor: f64,
    /// Largest per-cell pollutant reduction, as a fraction of the original value
    pub pollutant_floor_fraction: f64,
    pub weights: GridHcsWeights,
    pub equity_weight: f64,
}

impl Default for GridSimulationParams {
    fn default() -> Self {
        SIMULATION.grid
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub zone: ZoneSimulationSettings,
    pub confidence: ConfidenceSettings,
    pub grid: GridSimulationParams,
}

pub const SIMULATION: SimulationConfig = SimulationConfig {
    zone: ZoneSimulationSettings {
        point_buffer: 100.0,
        estimate_uncertainty: 0.2,
        facility_impact_radius: 5000.0,
        vegetation_reference_delta: 0.1,
    },
    confidence: ConfidenceSettings {
        base: 0.5,
        per_zone: 0.01,
        cap: 0.95,
    },
    grid: GridSimulationParams {
        pixel_size: 1000.0,
        service_radius: 300.0,
        max_cooling: 1.0,
        heat_decay_radius: 300.0,
        max_reduction_fraction: 0.05,
        pollutant_decay_radius: 150.0,
        lambda_m: 0.5,
        lambda_o: 2.0,
        temperature_floor: -2.0,
        pollutant_floor_fraction: 0.10,
        weights: SCORING.grid,
        equity_weight: SCORING.grid_equity_weight,
    },
};
