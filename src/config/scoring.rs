//! Score formula weights (Immutable Blueprints)

use serde::{Deserialize, Serialize};

/// Weights for the per-zone Healthy City Score.
///
/// `base = 100 - (heat*H + air*A) + (green*G + healthcare*C)`, where the heat
/// sub-index itself is `temp_z - heat_vegetation_coupling * green_z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneHcsWeights {
    pub heat: f64,
    pub air: f64,
    pub green: f64,
    pub healthcare: f64,
    /// How strongly vegetation offsets surface temperature inside the heat index
    pub heat_vegetation_coupling: f64,
    pub equity_weight: f64,
}

/// Weights for the grid Healthy City Score (temperature, pollutant, moisture).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridHcsWeights {
    pub temperature: f64,
    pub pollutant: f64,
    pub moisture: f64,
}

impl Default for GridHcsWeights {
    fn default() -> Self {
        SCORING.grid
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Score of a perfectly average city
    pub base_score: f64,
    pub zone: ZoneHcsWeights,
    pub grid: GridHcsWeights,
    pub grid_equity_weight: f64,
    /// Grid z-scores collapse to zero when the grid's std is below this
    pub min_grid_std: f64,
}

pub const SCORING: ScoringConfig = ScoringConfig {
    base_score: 100.0,
    zone: ZoneHcsWeights {
        heat: 0.35,
        air: 0.25,
        green: 0.25,
        healthcare: 0.15,
        heat_vegetation_coupling: 0.7,
        equity_weight: 0.4,
    },
    grid: GridHcsWeights {
        temperature: 0.4,
        pollutant: 0.4,
        moisture: 0.2,
    },
    grid_equity_weight: 0.4,
    min_grid_std: 1e-9,
};
