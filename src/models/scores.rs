use {
    super::{intervention::LayerDeltas, statistics::SummaryStats},
    crate::utils::nan_mean,
    geo::Polygon,
    ndarray::Array2,
    serde::{Deserialize, Serialize},
};

/// A zone's aggregated (mean) layer values. NaN marks a layer with no valid cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneLayerValues {
    pub vegetation: f64,
    pub temperature: f64,
    pub pollutant: f64,
    pub accessibility: f64,
}

impl ZoneLayerValues {
    pub fn apply(&self, deltas: &LayerDeltas) -> ZoneLayerValues {
        ZoneLayerValues {
            vegetation: self.vegetation + deltas.vegetation,
            temperature: self.temperature + deltas.temperature,
            pollutant: self.pollutant + deltas.pollutant,
            accessibility: self.accessibility + deltas.accessibility,
        }
    }
}

/// The four ZoneHCS sub-indices, all in z-score units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubIndices {
    pub heat: f64,
    pub air: f64,
    pub green: f64,
    pub healthcare: f64,
}

/// One row of the scored zone table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredZone {
    pub id: String,
    /// Equity-adjusted score
    pub hcs: f64,
    pub hcs_base: f64,
    pub heat_index: f64,
    pub air_risk_index: f64,
    pub green_access_index: f64,
    pub healthcare_index: f64,
    pub vulnerability: f64,
    pub values: ZoneLayerValues,
    pub geometry: Polygon<f64>,
}

/// Spread of HCS across a scored zone table. Statistics ignore NaN scores;
/// `tract_count` counts every row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneTableSummary {
    pub hcs_mean: f64,
    pub hcs_std: f64,
    pub hcs_min: f64,
    pub hcs_max: f64,
    pub tract_count: usize,
}

impl ZoneTableSummary {
    pub fn of(rows: &[ScoredZone]) -> Self {
        let s = SummaryStats::from_values(rows.iter().map(|z| z.hcs));
        Self {
            hcs_mean: s.mean,
            hcs_std: s.std,
            hcs_min: s.min,
            hcs_max: s.max,
            tract_count: rows.len(),
        }
    }
}

/// Citywide means of a score surface and its equity-adjusted form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub hcs_mean: f64,
    pub equity_mean: f64,
}

impl ScoreSummary {
    pub fn of(hcs: &Array2<f64>, equity: &Array2<f64>) -> Self {
        Self {
            hcs_mean: nan_mean(hcs.iter().copied()),
            equity_mean: nan_mean(equity.iter().copied()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn row(id: &str, hcs: f64) -> ScoredZone {
        ScoredZone {
            id: id.to_string(),
            hcs,
            hcs_base: hcs,
            heat_index: 0.0,
            air_risk_index: 0.0,
            green_access_index: 0.0,
            healthcare_index: 0.0,
            vulnerability: 0.0,
            values: ZoneLayerValues {
                vegetation: 0.3,
                temperature: 30.0,
                pollutant: 0.03,
                accessibility: 0.0,
            },
            geometry: polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
        }
    }

    #[test]
    fn test_zone_table_summary() {
        let summary = ZoneTableSummary::of(&[row("a", 98.0), row("b", 102.0), row("c", f64::NAN)]);
        assert_eq!(summary.tract_count, 3);
        assert!((summary.hcs_mean - 100.0).abs() < 1e-9);
        assert!((summary.hcs_std - 2.0).abs() < 1e-9);
        assert_eq!((summary.hcs_min, summary.hcs_max), (98.0, 102.0));

        let empty = ZoneTableSummary::of(&[]);
        assert_eq!(empty.tract_count, 0);
        assert!(empty.hcs_mean.is_nan());
    }
}
