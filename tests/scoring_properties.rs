use geo::{Point, polygon};
use healthy_city::{
    analysis::{AccessibilityModel, StatisticsNormalizer, aggregate, gravity},
    config::ACCESSIBILITY,
    domain::{Crs, Facility, FacilitySet, GeoTransform, Grid, Layer, Zone, ZoneSet},
    models::{CityStatistics, SummaryStats},
};
use ndarray::Array2;
use strum::IntoEnumIterator;

fn stats() -> CityStatistics {
    Layer::iter().enumerate().fold(CityStatistics::new(), |acc, (i, layer)| {
        let values = (0..20).map(|k| (k as f64 * 0.37 + i as f64).sin() * (i as f64 + 1.0));
        acc.with(layer, SummaryStats::from_values(values))
    })
}

#[test]
fn normalized_mean_is_zero_and_one_std_is_one() {
    let stats = stats();
    let normalizer = StatisticsNormalizer::new(&stats);
    for (layer, s) in &stats.layers {
        assert!(s.std > 0.0, "{} should vary", layer);
        assert!(normalizer.normalize(s.mean, *layer).abs() < 1e-12);
        assert!((normalizer.normalize(s.mean + s.std, *layer) - 1.0).abs() < 1e-12);
    }
}

#[test]
fn gravity_peaks_at_zero_distance_and_decreases() {
    for (capacity, decay) in [(1.0, 0.001), (1000.0, 0.01), (5.0, 2.0)] {
        assert_eq!(gravity(0.0, capacity, decay, ACCESSIBILITY.max_attraction), ACCESSIBILITY.max_attraction);
        let mut previous = f64::INFINITY;
        for d in [1.0, 10.0, 100.0, 500.0, 2000.0] {
            let g = gravity(d, capacity, decay, ACCESSIBILITY.max_attraction);
            assert!(g < previous);
            previous = g;
        }
    }
}

#[test]
fn zone_outside_grid_has_empty_statistics() {
    let grid = Grid::new(
        Array2::from_elem((5, 5), 1.0),
        GeoTransform::from_bounds(0.0, 0.0, 5.0, 5.0, 5, 5),
        Crs::Planar(32616),
    );
    let zones = ZoneSet::new(
        Crs::Planar(32616),
        vec![Zone::new(
            "far",
            polygon![(x: 100.0, y: 100.0), (x: 110.0, y: 100.0), (x: 110.0, y: 110.0), (x: 100.0, y: 110.0)],
        )],
    );

    let result = aggregate(&grid, &zones).unwrap();
    let s = result[0];
    assert_eq!(s.count, 0);
    assert!(s.mean.is_nan() && s.std.is_nan() && s.min.is_nan() && s.max.is_nan());
}

#[test]
fn accessibility_is_zero_without_nearby_facilities_and_grows_with_one() {
    let crs = Crs::Planar(32616);
    let zones = ZoneSet::new(
        crs,
        vec![Zone::new(
            "z",
            polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)],
        )],
    );
    let model = AccessibilityModel::default();
    let far = FacilitySet::new(crs, vec![Facility::clinic(Point::new(50.0, 50.0 + 2.0 * ACCESSIBILITY.threshold))]);

    let before = model.scores(&zones, &far).unwrap();
    assert_eq!(before, vec![0.0]);

    let near = far.with_facility(Facility::clinic(Point::new(50.0, 1050.0)));
    let after = model.scores(&zones, &near).unwrap();
    assert!(after[0] > before[0]);
}
