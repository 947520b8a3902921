//! Gravity-model healthcare accessibility.
//!
//! Every distance is measured in a planar frame: geographic inputs are moved
//! to Web Mercator metres first, planar inputs are used as they are.

use {
    crate::{
        config::{ACCESSIBILITY, AccessibilityConfig, DF},
        domain::{Crs, Facility, FacilitySet, ZoneSet},
        error::Result,
    },
    argminmax::ArgMinMax,
    geo::{Coord, Point},
    ndarray::Array2,
    serde::{Deserialize, Serialize},
};

/// Pairwise Euclidean distances (rows: `a`, cols: `b`) in the planar frame of `a_crs`.
pub fn distance_matrix(a: &[Point<f64>], a_crs: Crs, b: &[Point<f64>], b_crs: Crs) -> Result<Array2<f64>> {
    let frame = a_crs.planar_frame();
    let a = project_all(a, a_crs, frame)?;
    let b = project_all(b, b_crs, frame)?;

    Ok(Array2::from_shape_fn((a.len(), b.len()), |(i, j)| {
        let dx = a[i].x - b[j].x;
        let dy = a[i].y - b[j].y;
        dx.hypot(dy)
    }))
}

fn project_all(points: &[Point<f64>], from: Crs, to: Crs) -> Result<Vec<Coord<f64>>> {
    points.iter().map(|p| from.transform_coord(to, p.0)).collect()
}

/// `capacity / (1 + decay * distance²)`, clamped to `max_attraction`.
/// Co-located points (distance <= 0) get `max_attraction` itself.
pub fn gravity(distance: f64, capacity: f64, decay: f64, max_attraction: f64) -> f64 {
    if distance <= 0.0 {
        return max_attraction;
    }
    (capacity / (1.0 + decay * distance * distance)).min(max_attraction)
}

/// Distance to the nearest facility and how many lie within each access band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessSummary {
    pub nearest_distance: Option<f64>,
    pub nearest_index: Option<usize>,
    /// (band radius, facilities within it)
    pub bands: Vec<(f64, usize)>,
    pub total_facilities: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct AccessibilityModel {
    pub config: AccessibilityConfig,
}

impl Default for AccessibilityModel {
    fn default() -> Self {
        Self::new(ACCESSIBILITY)
    }
}

impl AccessibilityModel {
    pub fn new(config: AccessibilityConfig) -> Self {
        Self { config }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    pub fn attraction(&self, distance: f64, capacity: f64) -> f64 {
        gravity(distance, capacity, self.config.decay, self.config.max_attraction)
    }

    /// Per-zone sum of attraction over facilities with `0 < d <= threshold`
    /// from the zone centroid. Zones without a centroid score 0.
    pub fn scores(&self, zones: &ZoneSet, facilities: &FacilitySet) -> Result<Vec<f64>> {
        if facilities.is_empty() {
            return Ok(vec![0.0; zones.len()]);
        }

        let centroids = zones.centroids();
        let present: Vec<Point<f64>> = centroids.iter().flatten().copied().collect();
        let distances = distance_matrix(&present, zones.crs, &facilities.points(), facilities.crs)?;
        let capacities = facilities.capacities();

        let mut row = 0;
        let scores = centroids
            .iter()
            .map(|c| {
                if c.is_none() {
                    return 0.0;
                }
                let total = distances
                    .row(row)
                    .iter()
                    .zip(&capacities)
                    .filter(|&(&d, _)| d > 0.0 && d <= self.config.threshold)
                    .map(|(&d, &cap)| self.attraction(d, cap))
                    .sum();
                row += 1;
                total
            })
            .collect::<Vec<f64>>();

        if DF.log_accessibility {
            log::info!(
                "Accessibility for {} zones against {} facilities (threshold {})",
                zones.len(),
                facilities.len(),
                self.config.threshold
            );
        }
        Ok(scores)
    }

    /// `scores(existing ∪ {new}) - scores(existing)` per zone. The new facility
    /// location is taken to be in `existing.crs`.
    pub fn addition_delta(
        &self,
        zones: &ZoneSet,
        existing: &FacilitySet,
        new_location: Point<f64>,
        new_capacity: f64,
        facility_type: &str,
    ) -> Result<Vec<f64>> {
        let before = self.scores(zones, existing)?;
        let expanded = existing.with_facility(Facility::new(new_location, new_capacity, facility_type));
        let after = self.scores(zones, &expanded)?;
        Ok(after.iter().zip(&before).map(|(a, b)| a - b).collect())
    }

    /// Nearest facility and band counts for one location (in `crs`).
    pub fn access_summary(&self, location: Point<f64>, crs: Crs, facilities: &FacilitySet) -> Result<AccessSummary> {
        let distances = distance_matrix(&[location], crs, &facilities.points(), facilities.crs)?;
        let row: Vec<f64> = distances.row(0).to_vec();

        let nearest_index = if row.is_empty() {
            None
        } else {
            Some(row.as_slice().argmin())
        };
        let bands = self
            .config
            .access_bands
            .iter()
            .map(|&radius| (radius, row.iter().filter(|&&d| d <= radius).count()))
            .collect();

        Ok(AccessSummary {
            nearest_distance: nearest_index.map(|i| row[i]),
            nearest_index,
            bands,
            total_facilities: facilities.len(),
        })
    }
}

/// Shorthand for the default model's per-zone scores.
pub fn accessibility_scores(zones: &ZoneSet, facilities: &FacilitySet, threshold: f64) -> Result<Vec<f64>> {
    AccessibilityModel::default().with_threshold(threshold).scores(zones, facilities)
}

/// Shorthand for the default model's addition delta with a default-typed clinic.
pub fn facility_addition_delta(
    zones: &ZoneSet,
    existing: &FacilitySet,
    new_location: Point<f64>,
    new_capacity: f64,
) -> Result<Vec<f64>> {
    AccessibilityModel::default().addition_delta(
        zones,
        existing,
        new_location,
        new_capacity,
        crate::domain::DEFAULT_FACILITY_TYPE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Zone;
    use geo::polygon;

    const PLANAR: Crs = Crs::Planar(32616);

    // A 200 x 200 square centred on (cx, cy)
    fn zone_at(id: &str, cx: f64, cy: f64) -> Zone {
        Zone::new(
            id,
            polygon![
                (x: cx - 100.0, y: cy - 100.0),
                (x: cx + 100.0, y: cy - 100.0),
                (x: cx + 100.0, y: cy + 100.0),
                (x: cx - 100.0, y: cy + 100.0),
            ],
        )
    }

    #[test]
    fn test_gravity_clamp_and_monotonic() {
        for (cap, decay) in [(1000.0, 0.001), (1.0, 5.0), (5e9, 1e-9)] {
            assert_eq!(gravity(0.0, cap, decay, 1e6), 1e6);
            let mut last = f64::INFINITY;
            for d in [1.0, 10.0, 100.0, 1000.0, 10_000.0] {
                let g = gravity(d, cap, decay, 1e6);
                assert!(g <= last);
                last = g;
            }
        }
        let a = gravity(10.0, 1000.0, 0.001, 1e6);
        let b = gravity(20.0, 1000.0, 0.001, 1e6);
        assert!(b < a);
        assert!((a - 1000.0 / 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_distance_matrix_planar() {
        let a = [Point::new(0.0, 0.0), Point::new(3.0, 0.0)];
        let b = [Point::new(0.0, 4.0)];
        let d = distance_matrix(&a, PLANAR, &b, PLANAR).unwrap();
        assert_eq!(d.dim(), (2, 1));
        assert!((d[[0, 0]] - 4.0).abs() < 1e-12);
        assert!((d[[1, 0]] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_matrix_geographic_uses_metres() {
        let a = [Point::new(-87.63, 41.88)];
        let b = [Point::new(-87.62, 41.88)];
        let d = distance_matrix(&a, Crs::Wgs84, &b, Crs::Wgs84).unwrap();
        // 0.01 degree of longitude is ~1113 Mercator metres
        assert!((d[[0, 0]] - 1113.19).abs() < 1.0);
    }

    #[test]
    fn test_scores_threshold_and_empty() {
        let zones = ZoneSet::new(PLANAR, vec![zone_at("a", 0.0, 0.0), zone_at("b", 20_000.0, 0.0)]);
        let none = FacilitySet::empty(PLANAR);
        assert_eq!(accessibility_scores(&zones, &none, 5000.0).unwrap(), vec![0.0, 0.0]);

        let far = FacilitySet::new(PLANAR, vec![Facility::clinic(Point::new(10_000.0, 0.0))]);
        assert_eq!(accessibility_scores(&zones, &far, 5000.0).unwrap(), vec![0.0, 0.0]);

        let near = far.with_facility(Facility::clinic(Point::new(1_000.0, 0.0)));
        let scores = accessibility_scores(&zones, &near, 5000.0).unwrap();
        assert!(scores[0] > 0.0);
        assert!((scores[0] - 1000.0 / 1001.0).abs() < 1e-9);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn test_co_located_facility_is_excluded() {
        let zones = ZoneSet::new(PLANAR, vec![zone_at("a", 0.0, 0.0)]);
        let here = FacilitySet::new(PLANAR, vec![Facility::clinic(Point::new(0.0, 0.0))]);
        assert_eq!(accessibility_scores(&zones, &here, 5000.0).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_addition_delta() {
        let zones = ZoneSet::new(PLANAR, vec![zone_at("a", 0.0, 0.0), zone_at("b", 20_000.0, 0.0)]);
        let existing = FacilitySet::new(PLANAR, vec![Facility::clinic(Point::new(500.0, 0.0))]);
        let delta = facility_addition_delta(&zones, &existing, Point::new(0.0, 100.0), 1000.0).unwrap();
        assert!((delta[0] - 1000.0 / 11.0).abs() < 1e-9);
        assert_eq!(delta[1], 0.0);
    }

    #[test]
    fn test_access_summary() {
        let facilities = FacilitySet::new(
            PLANAR,
            vec![
                Facility::clinic(Point::new(3000.0, 0.0)),
                Facility::clinic(Point::new(400.0, 0.0)),
            ],
        );
        let s = AccessibilityModel::default()
            .access_summary(Point::new(0.0, 0.0), PLANAR, &facilities)
            .unwrap();
        assert_eq!(s.nearest_index, Some(1));
        assert_eq!(s.nearest_distance, Some(400.0));
        assert_eq!(s.bands[0], (500.0, 1));
        assert_eq!(s.bands[3], (5000.0, 2));
        assert_eq!(s.total_facilities, 2);

        let empty = AccessibilityModel::default()
            .access_summary(Point::new(0.0, 0.0), PLANAR, &FacilitySet::empty(PLANAR))
            .unwrap();
        assert_eq!(empty.nearest_distance, None);
    }
}
