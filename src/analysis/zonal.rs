use {
    crate::{
        config::DF,
        domain::{Grid, Mask, ZoneSet},
        error::Result,
        models::SummaryStats,
        trace_time,
    },
    geo::{BoundingRect, Contains, Polygon, Rect},
    ndarray::Array2,
    rayon::prelude::*,
    std::ops::Range,
};

/// Per-zone summary statistics of `grid`, index-aligned with `zones.zones`.
///
/// A cell belongs to a zone when its centre lies inside the polygon. Zones are
/// moved into the raster's CRS first; an unsupported reprojection fails with a
/// configuration error. Zones with no valid cells come back as `SummaryStats::EMPTY`.
pub fn aggregate(grid: &Grid, zones: &ZoneSet) -> Result<Vec<SummaryStats>> {
    let zones = zones.reprojected(grid.crs)?;

    let stats = trace_time!("zonal aggregate", 5_000, {
        zones
            .zones
            .par_iter()
            .map(|zone| zone_stats(grid, &zone.geometry))
            .collect::<Vec<_>>()
    });

    if DF.log_zonal {
        let empty = stats.iter().filter(|s| s.is_empty()).count();
        log::info!(
            "Aggregated {} zones over a {:?} grid ({} without valid cells)",
            stats.len(),
            grid.shape(),
            empty
        );
    }
    Ok(stats)
}

/// Per-zone means only.
pub fn zone_means(grid: &Grid, zones: &ZoneSet) -> Result<Vec<f64>> {
    Ok(aggregate(grid, zones)?.into_iter().map(|s| s.mean).collect())
}

/// Cells of `grid` whose centres fall inside `polygon` (polygon in the grid's CRS).
pub fn rasterize_polygon(grid: &Grid, polygon: &Polygon<f64>) -> Mask {
    let mut mask = Array2::from_elem(grid.shape(), false);
    for (row, col) in cells_in_polygon(grid, polygon) {
        mask[[row, col]] = true;
    }
    mask
}

fn zone_stats(grid: &Grid, polygon: &Polygon<f64>) -> SummaryStats {
    let values = cells_in_polygon(grid, polygon).map(|(row, col)| grid.data[[row, col]]);
    SummaryStats::from_values(values)
}

fn cells_in_polygon<'a>(
    grid: &'a Grid,
    polygon: &'a Polygon<f64>,
) -> impl Iterator<Item = (usize, usize)> + 'a {
    let (rows, cols) = polygon
        .bounding_rect()
        .and_then(|bbox| pixel_window(grid, &bbox))
        .unwrap_or((0..0, 0..0));

    rows.flat_map(move |row| cols.clone().map(move |col| (row, col)))
        .filter(move |&(row, col)| polygon.contains(&grid.cell_center(row, col)))
}

/// Row and column ranges covering a world rectangle, clipped to the raster.
fn pixel_window(grid: &Grid, bbox: &Rect<f64>) -> Option<(Range<usize>, Range<usize>)> {
    let (min, max) = (bbox.min(), bbox.max());
    let corners = [(min.x, min.y), (min.x, max.y), (max.x, min.y), (max.x, max.y)];

    let mut col_lo = f64::INFINITY;
    let mut col_hi = f64::NEG_INFINITY;
    let mut row_lo = f64::INFINITY;
    let mut row_hi = f64::NEG_INFINITY;
    for (x, y) in corners {
        let (col, row) = grid.transform.invert(x, y)?;
        col_lo = col_lo.min(col);
        col_hi = col_hi.max(col);
        row_lo = row_lo.min(row);
        row_hi = row_hi.max(row);
    }

    let (n_rows, n_cols) = grid.shape();
    let clip = |lo: f64, hi: f64, n: usize| -> Range<usize> {
        let start = lo.floor().max(0.0).min(n as f64) as usize;
        let end = hi.ceil().max(0.0).min(n as f64) as usize;
        start..end
    };
    let rows = clip(row_lo, row_hi, n_rows);
    let cols = clip(col_lo, col_hi, n_cols);
    if rows.is_empty() || cols.is_empty() {
        return None;
    }
    Some((rows, cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Crs, GeoTransform, Zone},
        error::HcsError,
    };
    use geo::polygon;

    // 10 x 10 cells over [0, 10] x [0, 10], value = row * 10 + col
    fn ramp() -> Grid {
        let data = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f64);
        Grid::new(
            data,
            GeoTransform::from_bounds(0.0, 0.0, 10.0, 10.0, 10, 10),
            Crs::Planar(32616),
        )
    }

    fn rect_zone(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Zone {
        Zone::new(
            id,
            polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)],
        )
    }

    #[test]
    fn test_aggregate_top_left_block() {
        // Top-left 2 x 2 cells: rows 0-1, cols 0-1 -> values 0, 1, 10, 11
        let zones = ZoneSet::new(Crs::Planar(32616), vec![rect_zone("a", 0.0, 8.0, 2.0, 10.0)]);
        let stats = aggregate(&ramp(), &zones).unwrap();
        assert_eq!(stats[0].count, 4);
        assert!((stats[0].mean - 5.5).abs() < 1e-12);
        assert_eq!((stats[0].min, stats[0].max), (0.0, 11.0));
        assert!((stats[0].std - 5.024_937_810_560_445).abs() < 1e-9);
    }

    #[test]
    fn test_zone_outside_extent_is_empty() {
        let zones = ZoneSet::new(
            Crs::Planar(32616),
            vec![rect_zone("out", 50.0, 50.0, 60.0, 60.0), rect_zone("in", 0.0, 0.0, 10.0, 10.0)],
        );
        let stats = aggregate(&ramp(), &zones).unwrap();
        assert_eq!(stats[0].count, 0);
        assert!(stats[0].mean.is_nan() && stats[0].std.is_nan());
        assert!(stats[0].min.is_nan() && stats[0].max.is_nan());
        assert_eq!(stats[1].count, 100);
    }

    #[test]
    fn test_nan_cells_are_discarded() {
        let mut grid = ramp();
        grid.data[[0, 0]] = f64::NAN;
        let zones = ZoneSet::new(Crs::Planar(32616), vec![rect_zone("a", 0.0, 8.0, 2.0, 10.0)]);
        let stats = aggregate(&grid, &zones).unwrap();
        assert_eq!(stats[0].count, 3);
        assert!((stats[0].mean - 22.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_unsupported_reprojection_is_configuration_error() {
        let zones = ZoneSet::new(Crs::Wgs84, vec![rect_zone("a", 0.0, 0.0, 1.0, 1.0)]);
        assert!(matches!(aggregate(&ramp(), &zones), Err(HcsError::Configuration(_))));
    }

    #[test]
    fn test_rasterize_polygon() {
        let mask = rasterize_polygon(&ramp(), &rect_zone("a", 2.0, 2.0, 5.0, 4.0).geometry);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 6);
        // y in (2, 4) -> rows 6 and 7; x in (2, 5) -> cols 2..5
        assert!(mask[[6, 2]] && mask[[7, 4]]);
        assert!(!mask[[5, 2]]);
    }
}
