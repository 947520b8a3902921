//! Gravity model constants

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccessibilityConfig {
    /// Distance-decay coefficient of the gravity kernel (per squared linear unit)
    pub decay: f64,
    /// Facilities further than this from a zone centroid contribute nothing
    pub threshold: f64,
    /// Upper clamp of a single attraction value (also returned for co-located points)
    pub max_attraction: f64,
    pub default_capacity: f64,
    /// Radii used for the "facilities within" access summary
    pub access_bands: [f64; 5],
}

pub const ACCESSIBILITY: AccessibilityConfig = AccessibilityConfig {
    decay: 0.001,
    threshold: 5000.0,
    max_attraction: 1_000_000.0,
    default_capacity: 1000.0,
    access_bands: [500.0, 1000.0, 2000.0, 5000.0, 10000.0],
};
