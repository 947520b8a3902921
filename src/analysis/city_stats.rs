use {
    super::accessibility::AccessibilityModel,
    crate::{
        config::DF,
        domain::{FacilitySet, Grid, Layer, ZoneSet},
        error::Result,
        models::{CityStatistics, SummaryStats},
    },
    std::collections::BTreeMap,
};

/// City-wide reference statistics: one entry per raster layer with any valid
/// cell, plus the accessibility layer when both zones and facilities are known.
pub fn compute_city_statistics(
    grids: &BTreeMap<Layer, Grid>,
    zones: Option<&ZoneSet>,
    facilities: Option<&FacilitySet>,
    model: &AccessibilityModel,
) -> Result<CityStatistics> {
    let mut stats = CityStatistics::new();

    for (&layer, grid) in grids {
        let summary = SummaryStats::from_values(grid.valid_values());
        if summary.is_empty() {
            log::warn!("No valid cells in layer '{}', leaving it out of the city statistics", layer);
            continue;
        }
        stats.insert(layer, summary);
    }

    if let (Some(zones), Some(facilities)) = (zones, facilities) {
        let scores = model.scores(zones, facilities)?;
        stats.insert(Layer::Accessibility, SummaryStats::from_values(scores));
    }

    if DF.log_stats_cache {
        log::info!("Computed statistics for {} layers", stats.len());
    }
    Ok(stats)
}
