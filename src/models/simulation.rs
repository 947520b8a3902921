use {
    super::{
        intervention::{InterventionKind, LayerDeltas},
        scores::{ScoreSummary, ScoredZone},
    },
    crate::domain::Mask,
    geo::Point,
    ndarray::Array2,
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcareEffectDescriptor {
    pub location: Point<f64>,
    pub capacity: f64,
    pub facility_type: String,
    pub impact_radius: f64,
}

/// Before/after of one affected zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneChange {
    pub zone_id: String,
    pub deltas: LayerDeltas,
    pub hcs_before: f64,
    pub hcs_after: f64,
    pub hcs_delta: f64,
}

/// Result of one zone-scoped action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSimulationReport {
    pub kind: InterventionKind,
    pub description: String,
    pub affected_zone_ids: Vec<String>,
    /// Raster-layer deltas of the action (accessibility is the mean over affected zones)
    pub layer_deltas: LayerDeltas,
    pub before: Vec<ScoredZone>,
    pub after: Vec<ScoredZone>,
    pub changes: Vec<ZoneChange>,
    /// (low, high) estimate of the per-zone HCS change
    pub estimated_delta_range: (f64, f64),
    pub healthcare_effect: Option<HealthcareEffectDescriptor>,
    pub warnings: Vec<String>,
}

impl ZoneSimulationReport {
    pub fn affected_count(&self) -> usize {
        self.affected_zone_ids.len()
    }
}

/// Temperature, pollutant and moisture surfaces on one shared raster layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSurfaces {
    pub temperature: Array2<f64>,
    pub pollutant: Array2<f64>,
    pub moisture: Array2<f64>,
}

impl ClimateSurfaces {
    pub fn shape(&self) -> (usize, usize) {
        self.temperature.dim()
    }

    pub fn is_consistent(&self) -> bool {
        let shape = self.shape();
        self.pollutant.dim() == shape && self.moisture.dim() == shape
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridDiagnostics {
    pub mean_equity_delta: f64,
    pub maintenance_penalty: f64,
    pub overlap_penalty: f64,
    /// Mean of the clipped coverage gain
    pub coverage_gain: f64,
    pub marginal_gain: f64,
}

/// Everything one grid-scoped placement produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSimulationResult {
    pub surfaces: ClimateSurfaces,
    pub delta_temperature: Array2<f64>,
    pub delta_pollutant: Array2<f64>,
    pub net_new: Mask,
    pub coverage_mask: Mask,
    pub coverage_before: Array2<f64>,
    pub coverage_after: Array2<f64>,
    pub coverage_gain: Array2<f64>,
    pub hcs_before: Array2<f64>,
    pub hcs_after: Array2<f64>,
    pub equity_before: Array2<f64>,
    pub equity_after: Array2<f64>,
    pub diagnostics: GridDiagnostics,
}

impl GridSimulationResult {
    pub fn summary_after(&self) -> ScoreSummary {
        ScoreSummary::of(&self.hcs_after, &self.equity_after)
    }
}

/// A committed optimizer placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStep {
    /// Row-major index of the winning cell
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub equity_delta: f64,
    pub marginal_gain: f64,
    pub coverage_gain: f64,
    pub maintenance_penalty: f64,
    pub overlap_penalty: f64,
    pub hcs_mean: f64,
    pub equity_mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub optimal_count: usize,
    pub baseline: ScoreSummary,
    pub steps: Vec<OptimizationStep>,
}

/// A request the aggregate run refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedAction {
    pub action_index: usize,
    pub kind: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionImpact {
    pub action_index: usize,
    pub kind: InterventionKind,
    pub description: String,
    pub affected_zone_count: usize,
    pub estimated_delta_range: (f64, f64),
    pub layer_deltas: LayerDeltas,
    pub healthcare_effect: Option<HealthcareEffectDescriptor>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneScorePoint {
    pub zone_id: String,
    pub hcs: f64,
}

/// Combined outcome of several zone-scoped actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSimulationResponse {
    pub city: String,
    pub actions_applied: usize,
    pub actions_rejected: Vec<RejectedAction>,
    pub affected_zone_count: usize,
    pub total_hcs_delta: f64,
    pub impacts: Vec<ActionImpact>,
    pub before: Vec<ZoneScorePoint>,
    pub after: Vec<ZoneScorePoint>,
    pub delta: Vec<ZoneScorePoint>,
    pub confidence: f64,
}
