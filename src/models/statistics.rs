use {
    crate::{
        domain::Layer,
        error::{HcsError, Result},
    },
    serde::{Deserialize, Serialize},
    statrs::statistics::Statistics,
    std::collections::BTreeMap,
};

/// Summary of a set of cell values. An empty set has count 0 and NaN everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl SummaryStats {
    pub const EMPTY: SummaryStats = SummaryStats {
        mean: f64::NAN,
        std: f64::NAN,
        min: f64::NAN,
        max: f64::NAN,
        count: 0,
    };

    /// NaN entries are discarded before summarising.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let valid: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        if valid.is_empty() {
            return Self::EMPTY;
        }
        let v = valid.as_slice();
        Self {
            mean: Statistics::mean(v),
            std: Statistics::population_std_dev(v),
            min: Statistics::min(v),
            max: Statistics::max(v),
            count: valid.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Per-layer city-wide reference statistics used for z-scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityStatistics {
    pub layers: BTreeMap<Layer, SummaryStats>,
}

impl CityStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, layer: Layer, stats: SummaryStats) {
        self.layers.insert(layer, stats);
    }

    pub fn with(mut self, layer: Layer, stats: SummaryStats) -> Self {
        self.insert(layer, stats);
        self
    }

    pub fn get(&self, layer: Layer) -> Option<&SummaryStats> {
        self.layers.get(&layer)
    }

    /// The layer's std, or DataUnavailable when the layer was never summarised.
    pub fn require_std(&self, layer: Layer) -> Result<f64> {
        self.get(layer)
            .filter(|s| !s.std.is_nan())
            .map(|s| s.std)
            .ok_or_else(|| HcsError::missing_stats(layer))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_ignores_nan() {
        let s = SummaryStats::from_values([2.0, f64::NAN, 4.0, 6.0]);
        assert_eq!(s.count, 3);
        assert!((s.mean - 4.0).abs() < 1e-12);
        assert!((s.std - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!((s.min, s.max), (2.0, 6.0));
    }

    #[test]
    fn test_empty_summary_is_nan() {
        let s = SummaryStats::from_values([f64::NAN]);
        assert!(s.is_empty());
        assert!(s.mean.is_nan() && s.std.is_nan() && s.min.is_nan() && s.max.is_nan());
    }

    #[test]
    fn test_require_std() {
        let stats = CityStatistics::new().with(Layer::Temperature, SummaryStats::from_values([1.0, 3.0]));
        assert_eq!(stats.require_std(Layer::Temperature).unwrap(), 1.0);
        assert!(matches!(
            stats.require_std(Layer::Pollutant),
            Err(HcsError::DataUnavailable(_))
        ));
    }
}
