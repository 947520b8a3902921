mod intervention;
mod scores;
mod simulation;
mod statistics;

pub use {
    intervention::{
        ActionRequest, EffectProfile, GeometryKind, HealthcareEffect, InterventionAction,
        InterventionDefinition, InterventionKind, LayerDeltas, PollutantEffect, TemperatureEffect,
        ValidationReport,
    },
    scores::{ScoreSummary, ScoredZone, SubIndices, ZoneLayerValues, ZoneTableSummary},
    simulation::{
        ActionImpact, AggregateSimulationResponse, ClimateSurfaces, GridDiagnostics,
        GridSimulationResult, HealthcareEffectDescriptor, OptimizationResult, OptimizationStep,
        RejectedAction, ZoneChange, ZoneScorePoint, ZoneSimulationReport,
    },
    statistics::{CityStatistics, SummaryStats},
};
