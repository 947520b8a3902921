//! The two Healthy City Score formulas.
//!
//! ZoneHCS scores zones from z-scored zone means against city statistics.
//! GridHCS scores every raster cell from z-scores of the grids themselves.
//! They use different weights and are deliberately kept apart.

use {
    super::normalizer::StatisticsNormalizer,
    crate::{
        config::{GridHcsWeights, SCORING, ZoneHcsWeights},
        domain::{Layer, Zone},
        error::{HcsError, Result},
        models::{ClimateSurfaces, ScoredZone, SubIndices, ZoneLayerValues},
        utils::nan_mean_and_stddev,
    },
    ndarray::{Array2, Zip},
};

/// Sub-indices of one zone. A NaN layer mean contributes a z of 0.
pub fn zone_sub_indices(
    values: &ZoneLayerValues,
    normalizer: &StatisticsNormalizer,
    weights: &ZoneHcsWeights,
) -> SubIndices {
    let z = |value: f64, layer: Layer| {
        let z = normalizer.normalize(value, layer);
        if z.is_nan() { 0.0 } else { z }
    };
    let temp_z = z(values.temperature, Layer::Temperature);
    let green_z = z(values.vegetation, Layer::Vegetation);
    let pollution_z = z(values.pollutant, Layer::Pollutant);
    let access_z = z(values.accessibility, Layer::Accessibility);

    SubIndices {
        heat: temp_z - weights.heat_vegetation_coupling * green_z,
        air: pollution_z,
        green: green_z,
        healthcare: access_z,
    }
}

/// `100 - (H*heat + A*air) + (G*green + C*healthcare)`
pub fn zone_hcs(indices: &SubIndices, weights: &ZoneHcsWeights) -> f64 {
    SCORING.base_score - (weights.heat * indices.heat + weights.air * indices.air)
        + (weights.green * indices.green + weights.healthcare * indices.healthcare)
}

/// `score * (1 - equity_weight * vulnerability)`
pub fn equity_adjust(score: f64, vulnerability: f64, equity_weight: f64) -> f64 {
    score * (1.0 - equity_weight * vulnerability)
}

/// Scores one zone from its aggregated layer values.
pub fn score_zone(
    zone: &Zone,
    values: ZoneLayerValues,
    normalizer: &StatisticsNormalizer,
    weights: &ZoneHcsWeights,
) -> ScoredZone {
    let indices = zone_sub_indices(&values, normalizer, weights);
    let base = zone_hcs(&indices, weights);
    let vulnerability = zone.vulnerability();

    ScoredZone {
        id: zone.id.clone(),
        hcs: equity_adjust(base, vulnerability, weights.equity_weight),
        hcs_base: base,
        heat_index: indices.heat,
        air_risk_index: indices.air,
        green_access_index: indices.green,
        healthcare_index: indices.healthcare,
        vulnerability,
        values,
        geometry: zone.geometry.clone(),
    }
}

/// Z-scores a grid against its own NaN-aware mean and population std.
/// A (near) constant grid maps to zeros; NaN cells stay NaN.
pub fn grid_zscore(grid: &Array2<f64>) -> Array2<f64> {
    match nan_mean_and_stddev(grid.iter().copied()) {
        Some((mean, std)) if std >= SCORING.min_grid_std => grid.mapv(|v| (v - mean) / std),
        _ => grid.mapv(|v| if v.is_nan() { f64::NAN } else { 0.0 }),
    }
}

/// `100 - (w_t*z(temperature) + w_a*z(pollutant) + w_m*z(moisture))`, cellwise.
pub fn grid_hcs(surfaces: &ClimateSurfaces, weights: &GridHcsWeights) -> Result<Array2<f64>> {
    if !surfaces.is_consistent() {
        return Err(HcsError::Validation(format!(
            "climate surfaces disagree in shape: {:?} / {:?} / {:?}",
            surfaces.temperature.dim(),
            surfaces.pollutant.dim(),
            surfaces.moisture.dim()
        )));
    }
    let t = grid_zscore(&surfaces.temperature);
    let a = grid_zscore(&surfaces.pollutant);
    let m = grid_zscore(&surfaces.moisture);

    Ok(Zip::from(&t).and(&a).and(&m).map_collect(|&t, &a, &m| {
        SCORING.base_score - (weights.temperature * t + weights.pollutant * a + weights.moisture * m)
    }))
}

/// Cellwise equity adjustment of a GridHCS surface.
pub fn grid_equity_adjust(
    score: &Array2<f64>,
    vulnerability: &Array2<f64>,
    equity_weight: f64,
) -> Result<Array2<f64>> {
    if score.dim() != vulnerability.dim() {
        return Err(HcsError::Validation(format!(
            "vulnerability shape {:?} does not match score shape {:?}",
            vulnerability.dim(),
            score.dim()
        )));
    }
    Ok(Zip::from(score)
        .and(vulnerability)
        .map_collect(|&s, &v| equity_adjust(s, v, equity_weight)))
}
