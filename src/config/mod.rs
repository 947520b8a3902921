//! Configuration module for the healthy city engine.

// Can all be private now because we have a public re-export.
mod accessibility;
mod debug;
mod demo;
mod optimizer;
mod persistence;
mod scoring;
mod simulation;

// Re-export commonly used items
pub use accessibility::{ACCESSIBILITY, AccessibilityConfig};
pub use debug::DF;
pub use demo::{DEMO, DemoBounds, DemoClinic, DemoConfig};
pub use optimizer::{OPTIMIZER, OptimizerConfig};
pub use persistence::{PERSISTENCE, stats_cache_filename};
pub use scoring::{GridHcsWeights, SCORING, ScoringConfig, ZoneHcsWeights};
pub use simulation::{
    ConfidenceSettings, GridSimulationParams, SIMULATION, SimulationConfig, ZoneSimulationSettings,
};
