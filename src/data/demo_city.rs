//! Deterministic synthetic city for the binaries and integration tests.
//!
//! Surfaces are radial: the core (raster centre) is hot, polluted, crowded and
//! vulnerable, the edges are cooler and greener. Noise is hashed from
//! `(seed, row, col)` so every build of the demo is identical.

use {
    crate::{
        analysis::zone_means,
        config::{DEMO, DemoConfig},
        domain::{Crs, Facility, FacilitySet, GeoTransform, Grid, Layer, Mask, VULNERABILITY_ATTRIBUTE, Zone, ZoneSet},
        engine::CityContext,
        error::Result,
    },
    geo::{Coord, polygon},
    ndarray::Array2,
};

const SEED: u64 = 0x4843_5321;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Uniform in [0, 1) for one cell of one noise stream.
fn uniform(stream: u64, row: usize, col: usize) -> f64 {
    let h = splitmix64(SEED ^ splitmix64(stream ^ splitmix64(((row as u64) << 32) | col as u64)));
    (h >> 11) as f64 / (1u64 << 53) as f64
}

/// Approximately standard normal (Irwin-Hall with 12 draws).
fn normal(stream: u64, row: usize, col: usize) -> f64 {
    (0..12u64).map(|k| uniform(stream * 16 + k, row, col)).sum::<f64>() - 6.0
}

/// Distance from the raster centre, scaled to [0, 1].
fn radial(shape: (usize, usize)) -> Array2<f64> {
    let (cy, cx) = (shape.0 as f64 / 2.0, shape.1 as f64 / 2.0);
    let max = cy.hypot(cx);
    Array2::from_shape_fn(shape, |(r, c)| (r as f64 - cy).hypot(c as f64 - cx) / max)
}

fn parks_mask(config: &DemoConfig) -> Mask {
    let mut mask = Array2::from_elem(config.shape, false);
    for &(r0, r1, c0, c1) in config.parks {
        for r in r0..r1.min(config.shape.0) {
            for c in c0..c1.min(config.shape.1) {
                mask[[r, c]] = true;
            }
        }
    }
    mask
}

/// Synthetic raster layers keyed by layer, all in Web Mercator.
pub fn demo_grids(config: &DemoConfig) -> Result<Vec<(Layer, Grid)>> {
    let b = &config.bounds;
    let sw = Crs::Wgs84.transform_coord(Crs::WebMercator, Coord { x: b.west, y: b.south })?;
    let ne = Crs::Wgs84.transform_coord(Crs::WebMercator, Coord { x: b.east, y: b.north })?;
    let (rows, cols) = config.shape;
    let transform = GeoTransform::from_bounds(sw.x, sw.y, ne.x, ne.y, cols, rows);

    let dn = radial(config.shape);
    let parks = parks_mask(config);
    let field = |f: &dyn Fn(f64, usize, usize) -> f64| {
        Array2::from_shape_fn(config.shape, |(r, c)| f(dn[[r, c]], r, c))
    };

    let temperature = field(&|d, r, c| 32.0 + 4.0 * d + 0.4 * normal(1, r, c));
    let pollutant = field(&|d, r, c| (0.03 + 0.02 * (1.0 - d) + 0.002 * normal(2, r, c)).max(0.005));
    let moisture = field(&|_, r, c| 3.0 + 0.3 * normal(3, r, c));
    let population = field(&|d, r, c| (2000.0 * (1.0 - d) + 100.0 * uniform(4, r, c)).max(0.0));
    let vulnerability = field(&|d, r, c| (0.6 * (1.0 - d) + 0.3 * uniform(5, r, c)).clamp(0.0, 1.0));
    let vegetation = field(&|d, r, c| {
        let park = if parks[[r, c]] { 0.3 } else { 0.0 };
        (0.2 + 0.4 * d + park + 0.03 * normal(6, r, c)).clamp(-1.0, 1.0)
    });

    let grid = |data| Grid::new(data, transform, Crs::WebMercator);
    Ok(vec![
        (Layer::Vegetation, grid(vegetation)),
        (Layer::Temperature, grid(temperature)),
        (Layer::Pollutant, grid(pollutant)),
        (Layer::Moisture, grid(moisture)),
        (Layer::Population, grid(population)),
        (Layer::Vulnerability, grid(vulnerability)),
    ])
}

/// Rectangular tracts over the demo bounds, ids `tract_RR_CC`, in WGS84.
pub fn demo_zones(config: &DemoConfig) -> ZoneSet {
    let b = &config.bounds;
    let (zr, zc) = config.zone_lattice;
    let dx = (b.east - b.west) / zc as f64;
    let dy = (b.north - b.south) / zr as f64;

    let zones = (0..zr)
        .flat_map(|r| (0..zc).map(move |c| (r, c)))
        .map(|(r, c)| {
            let (x0, y1) = (b.west + c as f64 * dx, b.north - r as f64 * dy);
            let (x1, y0) = (x0 + dx, y1 - dy);
            Zone::new(
                format!("tract_{:02}_{:02}", r, c),
                polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)],
            )
        })
        .collect();
    ZoneSet::new(Crs::Wgs84, zones)
}

pub fn demo_facilities(config: &DemoConfig) -> FacilitySet {
    FacilitySet::new(
        Crs::Wgs84,
        config
            .clinics
            .iter()
            .map(|&(lon, lat, capacity)| Facility::new((lon, lat).into(), capacity, crate::domain::DEFAULT_FACILITY_TYPE))
            .collect(),
    )
}

/// The full demo context (no statistics yet).
///
/// Tract vulnerability is the zonal mean of the vulnerability surface.
pub fn demo_context() -> Result<CityContext> {
    let config = &DEMO;
    let grids = demo_grids(config)?;
    let mut zones = demo_zones(config);

    if let Some((_, vulnerability)) = grids.iter().find(|(layer, _)| *layer == Layer::Vulnerability) {
        let means = zone_means(vulnerability, &zones)?;
        zones.zones = std::mem::take(&mut zones.zones)
            .into_iter()
            .zip(means)
            .map(|(zone, v)| if v.is_nan() { zone } else { zone.with_attribute(VULNERABILITY_ATTRIBUTE, v) })
            .collect();
    }

    let builder = grids.into_iter().fold(CityContext::builder(config.city), |b, (layer, grid)| b.grid(layer, grid));
    builder
        .zones(zones)
        .facilities(demo_facilities(config))
        .coverage_mask(parks_mask(config))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_deterministic_and_bounded() {
        assert_eq!(uniform(1, 3, 4), uniform(1, 3, 4));
        assert_ne!(uniform(1, 3, 4), uniform(2, 3, 4));
        for r in 0..20 {
            let u = uniform(7, r, r * 3);
            assert!((0.0..1.0).contains(&u));
            assert!(normal(7, r, r).abs() <= 6.0);
        }
    }

    #[test]
    fn test_demo_surfaces_respect_ranges() {
        let grids = demo_grids(&DEMO).unwrap();
        assert_eq!(grids.len(), 6);
        for (layer, grid) in &grids {
            assert_eq!(grid.shape(), DEMO.shape);
            match layer {
                Layer::Pollutant => assert!(grid.data.iter().all(|&v| v >= 0.005)),
                Layer::Population => assert!(grid.data.iter().all(|&v| v >= 0.0)),
                Layer::Vulnerability => assert!(grid.data.iter().all(|&v| (0.0..=1.0).contains(&v))),
                _ => {}
            }
        }
    }

    #[test]
    fn test_demo_context_assembles() {
        let ctx = demo_context().unwrap();
        let zones = ctx.zones().unwrap();
        assert_eq!(zones.len(), 36);
        assert!(zones.zones.iter().all(|z| z.vulnerability() > 0.0));
        assert_eq!(ctx.facilities().map(FacilitySet::len), Some(4));
        let covered = ctx.coverage_mask().unwrap().iter().filter(|&&c| c).count();
        assert_eq!(covered, 7 * 6 + 7 * 6);
    }
}
