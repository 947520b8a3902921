use {
    crate::{domain::Layer, models::CityStatistics},
    ndarray::Array2,
};

/// Z-scores raw layer values against cached city statistics.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsNormalizer<'a> {
    stats: &'a CityStatistics,
}

impl<'a> StatisticsNormalizer<'a> {
    pub fn new(stats: &'a CityStatistics) -> Self {
        Self { stats }
    }

    /// `(value - mean) / std`.
    /// NaN stays NaN. A layer with no statistics, or no variation, maps to 0.
    pub fn normalize(&self, value: f64, layer: Layer) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        match self.stats.get(layer) {
            Some(s) if s.std > 0.0 && s.mean.is_finite() => (value - s.mean) / s.std,
            _ => 0.0,
        }
    }

    pub fn normalize_array(&self, values: &Array2<f64>, layer: Layer) -> Array2<f64> {
        values.mapv(|v| self.normalize(v, layer))
    }
}
