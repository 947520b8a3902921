use {
    super::{
        accessibility::AccessibilityModel,
        catalog::{definition, derive_deltas, validate},
        normalizer::StatisticsNormalizer,
        scoring::score_zone,
    },
    crate::{
        config::{DF, SCORING, SIMULATION, ZoneHcsWeights, ZoneSimulationSettings},
        domain::{Crs, FacilitySet, ZoneSet, reproject},
        error::{HcsError, Result},
        models::{
            ActionRequest, CityStatistics, HealthcareEffectDescriptor, InterventionAction, LayerDeltas,
            ScoredZone, ZoneChange, ZoneSimulationReport,
        },
    },
    geo::{EuclideanDistance, Geometry, Intersects, Point},
};

/// Applies one intervention to a scored zone table.
///
/// `zones` must be index-aligned with the baseline rows handed to [`ZoneSimulator::apply`].
/// Facilities are only needed by actions that add a facility.
#[derive(Debug, Clone, Copy)]
pub struct ZoneSimulator<'a> {
    pub zones: &'a ZoneSet,
    pub facilities: Option<&'a FacilitySet>,
    pub stats: &'a CityStatistics,
    pub settings: ZoneSimulationSettings,
    pub weights: ZoneHcsWeights,
    pub accessibility: AccessibilityModel,
}

impl<'a> ZoneSimulator<'a> {
    pub fn new(zones: &'a ZoneSet, facilities: Option<&'a FacilitySet>, stats: &'a CityStatistics) -> Self {
        Self {
            zones,
            facilities,
            stats,
            settings: SIMULATION.zone,
            weights: SCORING.zone,
            accessibility: AccessibilityModel::default(),
        }
    }

    pub fn apply(&self, action: &InterventionAction, baseline: &[ScoredZone]) -> Result<ZoneSimulationReport> {
        if baseline.len() != self.zones.len() {
            return Err(HcsError::Validation(format!(
                "baseline has {} rows for {} zones",
                baseline.len(),
                self.zones.len()
            )));
        }

        // 1. Validate
        let report = validate(&request_for(action))?;
        if !report.valid {
            return Err(HcsError::Validation(report.errors.join("; ")));
        }
        let def = definition(action.kind());

        // 2. Affected zones
        let affected = match action.geometry() {
            Some(geometry) => self.affected_zones(geometry)?,
            None => Vec::new(),
        };

        let empty = ZoneSimulationReport {
            kind: def.kind,
            description: def.description.to_string(),
            affected_zone_ids: Vec::new(),
            layer_deltas: LayerDeltas::default(),
            before: Vec::new(),
            after: Vec::new(),
            changes: Vec::new(),
            estimated_delta_range: (0.0, 0.0),
            healthcare_effect: None,
            warnings: report.warnings,
        };
        // 6. Nothing to change
        if affected.is_empty() {
            if DF.log_simulation {
                log::info!("{}: no zone affected", def.kind);
            }
            return Ok(empty);
        }

        // 3. Layer deltas, per zone for facility additions
        let raster = derive_deltas(def, self.stats)?;
        let (per_zone, healthcare_effect) = match action {
            InterventionAction::AddClinic {
                geometry,
                capacity,
                facility_type,
            } => {
                let location = clinic_location(geometry.as_ref())?;
                let access = self.clinic_accessibility_deltas(location, *capacity, facility_type)?;
                let per_zone: Vec<LayerDeltas> = affected
                    .iter()
                    .map(|&i| LayerDeltas {
                        accessibility: raster.accessibility + access[i],
                        ..raster
                    })
                    .collect();
                let descriptor = HealthcareEffectDescriptor {
                    location,
                    capacity: *capacity,
                    facility_type: facility_type.clone(),
                    impact_radius: self.settings.facility_impact_radius,
                };
                (per_zone, Some(descriptor))
            }
            _ => (vec![raster; affected.len()], None),
        };

        // 4. Rescore the affected zones
        let normalizer = StatisticsNormalizer::new(self.stats);
        let before: Vec<ScoredZone> = affected.iter().map(|&i| baseline[i].clone()).collect();
        let after = apply_zone_deltas(&before, self.zones, &affected, &per_zone, &normalizer, &self.weights);
        let changes = before
            .iter()
            .zip(&after)
            .zip(&per_zone)
            .map(|((b, a), d)| ZoneChange {
                zone_id: b.id.clone(),
                deltas: *d,
                hcs_before: b.hcs,
                hcs_after: a.hcs,
                hcs_delta: a.hcs - b.hcs,
            })
            .collect();

        // 5. Closed-form estimate and report
        let mean_access = per_zone.iter().map(|d| d.accessibility).sum::<f64>() / per_zone.len() as f64;
        let layer_deltas = LayerDeltas {
            accessibility: mean_access,
            ..raster
        };
        let estimated_delta_range =
            estimate_hcs_delta(&layer_deltas, &self.weights, self.settings.estimate_uncertainty);

        if DF.log_simulation {
            log::info!(
                "{}: {} zones affected, estimated HCS delta {:.3}..{:.3}",
                def.kind,
                affected.len(),
                estimated_delta_range.0,
                estimated_delta_range.1
            );
        }

        Ok(ZoneSimulationReport {
            affected_zone_ids: before.iter().map(|z| z.id.clone()).collect(),
            layer_deltas,
            before,
            after,
            changes,
            estimated_delta_range,
            healthcare_effect,
            ..empty
        })
    }

    /// Indices of zones the action geometry touches. Points reach every zone
    /// within `point_buffer` linear units, measured in the planar frame.
    pub fn affected_zones(&self, geometry: &Geometry<f64>) -> Result<Vec<usize>> {
        let crs = self.zones.crs;
        match geometry {
            Geometry::Point(p) => self.zones_near(&[*p], crs),
            Geometry::MultiPoint(mp) => self.zones_near(&mp.0, crs),
            other => Ok(self
                .zones
                .zones
                .iter()
                .enumerate()
                .filter(|(_, z)| other.intersects(&z.geometry))
                .map(|(i, _)| i)
                .collect()),
        }
    }

    fn zones_near(&self, points: &[Point<f64>], crs: Crs) -> Result<Vec<usize>> {
        let frame = crs.planar_frame();
        let planar_zones = self.zones.reprojected(frame)?;
        let planar_points = points
            .iter()
            .map(|p| reproject(p, crs, frame))
            .collect::<Result<Vec<_>>>()?;

        Ok(planar_zones
            .zones
            .iter()
            .enumerate()
            .filter(|(_, z)| {
                planar_points
                    .iter()
                    .any(|p| p.euclidean_distance(&z.geometry) <= self.settings.point_buffer)
            })
            .map(|(i, _)| i)
            .collect())
    }

    fn clinic_accessibility_deltas(&self, location: Point<f64>, capacity: f64, facility_type: &str) -> Result<Vec<f64>> {
        let facilities = self
            .facilities
            .ok_or_else(|| HcsError::DataUnavailable("no facility set for accessibility recomputation".into()))?;
        // The action geometry is in the zones' CRS; the facility set may differ.
        let location = reproject(&location, self.zones.crs, facilities.crs)?;
        self.accessibility
            .addition_delta(self.zones, facilities, location, capacity, facility_type)
    }
}

fn clinic_location(geometry: Option<&Geometry<f64>>) -> Result<Point<f64>> {
    match geometry {
        Some(Geometry::Point(p)) => Ok(*p),
        Some(Geometry::MultiPoint(mp)) if !mp.0.is_empty() => Ok(mp.0[0]),
        _ => Err(HcsError::Validation("a facility needs a point location".into())),
    }
}

fn request_for(action: &InterventionAction) -> ActionRequest {
    let mut request = ActionRequest::new(action.kind().to_string(), action.geometry().cloned());
    if let InterventionAction::AddClinic {
        capacity,
        facility_type,
        ..
    } = action
    {
        request.capacity = Some(*capacity);
        request.facility_type = Some(facility_type.clone());
    }
    request
}

/// Rescores `rows` (the zones at `indices`) after adding `deltas[k]` to row `k`.
pub fn apply_zone_deltas(
    rows: &[ScoredZone],
    zones: &ZoneSet,
    indices: &[usize],
    deltas: &[LayerDeltas],
    normalizer: &StatisticsNormalizer,
    weights: &ZoneHcsWeights,
) -> Vec<ScoredZone> {
    rows.iter()
        .zip(indices)
        .zip(deltas)
        .map(|((row, &i), d)| score_zone(&zones.zones[i], row.values.apply(d), normalizer, weights))
        .collect()
}

/// ZoneHCS-weighted combination of the raw layer deltas, widened by `±uncertainty`
/// of its magnitude. Only an accessibility gain contributes.
pub fn estimate_hcs_delta(deltas: &LayerDeltas, weights: &ZoneHcsWeights, uncertainty: f64) -> (f64, f64) {
    let heat = -(weights.heat * (deltas.temperature - weights.heat_vegetation_coupling * deltas.vegetation));
    let air = -(weights.air * deltas.pollutant);
    let green = weights.green * deltas.vegetation;
    let healthcare = if deltas.accessibility > 0.0 {
        weights.healthcare * deltas.accessibility
    } else {
        0.0
    };

    let total = heat + air + green + healthcare;
    let spread = total.abs() * uncertainty;
    (total - spread, total + spread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Facility, Layer, Zone},
        models::{SummaryStats, ZoneLayerValues},
    };
    use geo::{line_string, polygon};

    const PLANAR: Crs = Crs::Planar(32616);

    fn stats() -> CityStatistics {
        CityStatistics::new()
            .with(Layer::Temperature, SummaryStats::from_values([30.0, 34.0]))
            .with(Layer::Vegetation, SummaryStats::from_values([0.2, 0.4]))
            .with(Layer::Pollutant, SummaryStats::from_values([0.02, 0.04]))
            .with(Layer::Accessibility, SummaryStats::from_values([0.0, 10.0]))
    }

    // Two 1000 x 1000 zones side by side
    fn zones() -> ZoneSet {
        let square = |id: &str, x0: f64| {
            Zone::new(
                id,
                polygon![(x: x0, y: 0.0), (x: x0 + 1000.0, y: 0.0), (x: x0 + 1000.0, y: 1000.0), (x: x0, y: 1000.0)],
            )
            .with_attribute("vulnerability", 0.25)
        };
        ZoneSet::new(PLANAR, vec![square("west", 0.0), square("east", 1000.0)])
    }

    fn baseline(zones: &ZoneSet, stats: &CityStatistics) -> Vec<ScoredZone> {
        let normalizer = StatisticsNormalizer::new(stats);
        zones
            .zones
            .iter()
            .map(|z| {
                let values = ZoneLayerValues {
                    vegetation: 0.3,
                    temperature: 33.0,
                    pollutant: 0.03,
                    accessibility: 5.0,
                };
                score_zone(z, values, &normalizer, &SCORING.zone)
            })
            .collect()
    }

    fn park(x0: f64, x1: f64) -> InterventionAction {
        InterventionAction::AddPark {
            geometry: Some(polygon![(x: x0, y: 100.0), (x: x1, y: 100.0), (x: x1, y: 200.0), (x: x0, y: 200.0)].into()),
        }
    }

    #[test]
    fn test_park_affects_intersecting_zone_only() {
        let (zones, stats) = (zones(), stats());
        let base = baseline(&zones, &stats);
        let report = ZoneSimulator::new(&zones, None, &stats).apply(&park(100.0, 200.0), &base).unwrap();

        assert_eq!(report.affected_zone_ids, vec!["west".to_string()]);
        assert_eq!(report.changes.len(), 1);
        // Cooler and greener is better
        assert!(report.changes[0].hcs_delta > 0.0);
        let (lo, hi) = report.estimated_delta_range;
        assert!(lo > 0.0 && hi > lo);
        assert!(((lo + hi) / 2.0 * 0.2 - (hi - lo) / 2.0).abs() < 1e-9);
        assert!(report.healthcare_effect.is_none());
    }

    #[test]
    fn test_estimate_combines_raw_deltas() {
        let park = LayerDeltas {
            vegetation: 0.08,
            temperature: -0.96,
            ..Default::default()
        };
        let (lo, hi) = estimate_hcs_delta(&park, &SCORING.zone, 0.2);
        // 0.35 * (0.96 + 0.7 * 0.08) + 0.25 * 0.08
        assert!(((lo + hi) / 2.0 - 0.3756).abs() < 1e-12);
        assert!((hi - lo - 2.0 * 0.2 * 0.3756).abs() < 1e-12);

        let (lo, hi) = estimate_hcs_delta(&LayerDeltas { pollutant: 0.04, ..Default::default() }, &SCORING.zone, 0.2);
        assert!(lo < hi && hi < 0.0);
        assert!(((lo + hi) / 2.0 + 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_ignores_accessibility_loss() {
        let gain = LayerDeltas { accessibility: 10.0, ..Default::default() };
        let loss = LayerDeltas { accessibility: -10.0, ..Default::default() };
        let (lo, hi) = estimate_hcs_delta(&gain, &SCORING.zone, 0.2);
        assert!(((lo + hi) / 2.0 - 1.5).abs() < 1e-12);
        assert_eq!(estimate_hcs_delta(&loss, &SCORING.zone, 0.2), (0.0, 0.0));
    }

    #[test]
    fn test_park_estimate_uses_catalog_deltas() {
        let (zones, stats) = (zones(), stats());
        let base = baseline(&zones, &stats);
        let report = ZoneSimulator::new(&zones, None, &stats).apply(&park(100.0, 200.0), &base).unwrap();
        let (lo, hi) = report.estimated_delta_range;
        let expected = estimate_hcs_delta(&report.layer_deltas, &SCORING.zone, SIMULATION.zone.estimate_uncertainty);
        assert_eq!((lo, hi), expected);
        assert!(lo > 0.0);
    }

    #[test]
    fn test_no_affected_zone_is_empty_report() {
        let (zones, stats) = (zones(), stats());
        let base = baseline(&zones, &stats);
        let report = ZoneSimulator::new(&zones, None, &stats)
            .apply(&park(5000.0, 6000.0), &base)
            .unwrap();
        assert!(report.affected_zone_ids.is_empty());
        assert!(report.changes.is_empty());
        assert_eq!(report.estimated_delta_range, (0.0, 0.0));
    }

    #[test]
    fn test_point_buffer_reaches_neighbouring_zone() {
        let (zones, stats) = (zones(), stats());
        let sim = ZoneSimulator::new(&zones, None, &stats);
        let near_edge: Geometry<f64> = Point::new(950.0, 500.0).into();
        assert_eq!(sim.affected_zones(&near_edge).unwrap(), vec![0, 1]);
        let inside: Geometry<f64> = Point::new(500.0, 500.0).into();
        assert_eq!(sim.affected_zones(&inside).unwrap(), vec![0]);
        let outside: Geometry<f64> = Point::new(2090.0, 500.0).into();
        assert_eq!(sim.affected_zones(&outside).unwrap(), vec![1]);
    }

    #[test]
    fn test_line_geometry_intersects() {
        let (zones, stats) = (zones(), stats());
        let sim = ZoneSimulator::new(&zones, None, &stats);
        let street: Geometry<f64> = line_string![(x: 500.0, y: 500.0), (x: 1500.0, y: 500.0)].into();
        assert_eq!(sim.affected_zones(&street).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_clinic_recomputes_accessibility() {
        let (zones, stats) = (zones(), stats());
        let base = baseline(&zones, &stats);
        let facilities = FacilitySet::new(PLANAR, vec![Facility::clinic(Point::new(3000.0, 3000.0))]);
        let clinic = InterventionAction::AddClinic {
            geometry: Some(Point::new(600.0, 500.0).into()),
            capacity: 1000.0,
            facility_type: "healthcare_clinic".into(),
        };
        let report = ZoneSimulator::new(&zones, Some(&facilities), &stats)
            .apply(&clinic, &base)
            .unwrap();
        assert_eq!(report.affected_zone_ids, vec!["west".to_string()]);
        // Centroid (500, 500) is 100 units from the clinic
        assert!((report.changes[0].deltas.accessibility - 1000.0 / 11.0).abs() < 1e-9);
        let effect = report.healthcare_effect.unwrap();
        assert_eq!(effect.impact_radius, 5000.0);
        assert_eq!(effect.capacity, 1000.0);

        assert!(matches!(
            ZoneSimulator::new(&zones, None, &stats).apply(&clinic, &base),
            Err(HcsError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_geometry_is_rejected() {
        let (zones, stats) = (zones(), stats());
        let base = baseline(&zones, &stats);
        let result = ZoneSimulator::new(&zones, None, &stats).apply(&InterventionAction::CoolRoof { geometry: None }, &base);
        assert!(matches!(result, Err(HcsError::Validation(_))));
    }

    #[test]
    fn test_negated_deltas_restore_scores() {
        let (zones, stats) = (zones(), stats());
        let base = baseline(&zones, &stats);
        let normalizer = StatisticsNormalizer::new(&stats);
        let d = LayerDeltas {
            vegetation: 0.08,
            temperature: -0.96,
            pollutant: -0.004,
            accessibility: 12.0,
        };
        let idx = [0, 1];
        let changed = apply_zone_deltas(&base, &zones, &idx, &[d, d], &normalizer, &SCORING.zone);
        let restored = apply_zone_deltas(&changed, &zones, &idx, &[-d, -d], &normalizer, &SCORING.zone);
        for (a, b) in restored.iter().zip(&base) {
            assert!((a.hcs - b.hcs).abs() < 1e-9);
            assert!((a.heat_index - b.heat_index).abs() < 1e-9);
        }
    }
}
