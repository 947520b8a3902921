// Scoring, simulation and search algorithms
pub mod accessibility;
pub mod catalog;
pub mod city_stats;
pub mod coverage;
pub mod grid_simulation;
pub mod normalizer;
pub mod optimizer;
pub mod scoring;
pub mod zonal;
pub mod zone_simulation;

pub use {
    accessibility::{AccessSummary, AccessibilityModel, accessibility_scores, distance_matrix, facility_addition_delta, gravity},
    catalog::{CATALOG, definition, derive_deltas, lookup, parse_action, validate},
    city_stats::compute_city_statistics,
    grid_simulation::{apply_grid, need_surface},
    normalizer::StatisticsNormalizer,
    optimizer::GreedyOptimizer,
    scoring::{equity_adjust, grid_equity_adjust, grid_hcs, grid_zscore, score_zone, zone_hcs, zone_sub_indices},
    zonal::{aggregate, rasterize_polygon, zone_means},
    zone_simulation::{ZoneSimulator, apply_zone_deltas, estimate_hcs_delta},
};
