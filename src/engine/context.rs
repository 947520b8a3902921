use {
    crate::{
        analysis::{
            AccessibilityModel, GreedyOptimizer, ZoneSimulator, apply_grid, compute_city_statistics,
            score_zone, zone_means, StatisticsNormalizer,
        },
        config::{GridSimulationParams, OptimizerConfig, SCORING},
        data::{StatisticsCache, load_or_compute},
        domain::{FacilitySet, Grid, Layer, Mask, ZoneSet},
        error::{HcsError, Result},
        models::{
            CityStatistics, ClimateSurfaces, GridSimulationResult, OptimizationResult, ScoredZone,
            ZoneLayerValues, ZoneTableSummary,
        },
    },
    ndarray::Array2,
    std::{collections::BTreeMap, sync::Arc},
};

/// Everything one request needs about one city. Built per request and
/// dropped with it; nothing here is shared between independent computations.
#[derive(Debug, Clone)]
pub struct CityContext {
    city: String,
    grids: BTreeMap<Layer, Grid>,
    zones: Option<ZoneSet>,
    facilities: Option<FacilitySet>,
    coverage: Option<Mask>,
    stats: Option<Arc<CityStatistics>>,
    accessibility: AccessibilityModel,
}

#[derive(Debug, Default)]
pub struct CityContextBuilder {
    city: String,
    grids: BTreeMap<Layer, Grid>,
    zones: Option<ZoneSet>,
    facilities: Option<FacilitySet>,
    coverage: Option<Mask>,
    stats: Option<Arc<CityStatistics>>,
    accessibility: Option<AccessibilityModel>,
}

impl CityContextBuilder {
    pub fn grid(mut self, layer: Layer, grid: Grid) -> Self {
        self.grids.insert(layer, grid);
        self
    }

    pub fn zones(mut self, zones: ZoneSet) -> Self {
        self.zones = Some(zones);
        self
    }

    pub fn facilities(mut self, facilities: FacilitySet) -> Self {
        self.facilities = Some(facilities);
        self
    }

    /// Cells already served (existing parks)
    pub fn coverage_mask(mut self, mask: Mask) -> Self {
        self.coverage = Some(mask);
        self
    }

    pub fn statistics(mut self, stats: Arc<CityStatistics>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn accessibility(mut self, model: AccessibilityModel) -> Self {
        self.accessibility = Some(model);
        self
    }

    /// Every grid (and the coverage mask) must share one shape.
    pub fn build(self) -> Result<CityContext> {
        let mut shapes = self.grids.iter().map(|(layer, g)| (layer.to_string(), g.shape()));
        if let Some((first_layer, shape)) = shapes.next() {
            if let Some((layer, other)) = shapes.find(|(_, s)| *s != shape) {
                return Err(HcsError::Validation(format!(
                    "layer '{}' has shape {:?} but '{}' has {:?}",
                    layer, other, first_layer, shape
                )));
            }
            if let Some(mask) = &self.coverage {
                if mask.dim() != shape {
                    return Err(HcsError::Validation(format!(
                        "coverage mask shape {:?} does not match grid shape {:?}",
                        mask.dim(),
                        shape
                    )));
                }
            }
        }

        Ok(CityContext {
            city: self.city,
            grids: self.grids,
            zones: self.zones,
            facilities: self.facilities,
            coverage: self.coverage,
            stats: self.stats,
            accessibility: self.accessibility.unwrap_or_default(),
        })
    }
}

impl CityContext {
    pub fn builder(city: impl Into<String>) -> CityContextBuilder {
        CityContextBuilder {
            city: city.into(),
            ..Default::default()
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn grid(&self, layer: Layer) -> Option<&Grid> {
        self.grids.get(&layer)
    }

    pub fn require_grid(&self, layer: Layer) -> Result<&Grid> {
        self.grid(layer).ok_or_else(|| HcsError::missing_layer(layer))
    }

    pub fn zones(&self) -> Result<&ZoneSet> {
        self.zones
            .as_ref()
            .ok_or_else(|| HcsError::DataUnavailable(format!("no zone set loaded for '{}'", self.city)))
    }

    pub fn facilities(&self) -> Option<&FacilitySet> {
        self.facilities.as_ref()
    }

    pub fn accessibility_model(&self) -> &AccessibilityModel {
        &self.accessibility
    }

    /// The shared raster shape, if any grid is loaded.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.grids.values().next().map(Grid::shape)
    }

    /// Raster cell edge in the grids' linear units.
    pub fn pixel_size(&self) -> Option<f64> {
        self.grids.values().next().map(Grid::pixel_size)
    }

    /// Existing coverage, or an empty mask of the raster shape.
    pub fn coverage_mask(&self) -> Result<Mask> {
        match (&self.coverage, self.shape()) {
            (Some(mask), _) => Ok(mask.clone()),
            (None, Some(shape)) => Ok(Array2::from_elem(shape, false)),
            (None, None) => Err(HcsError::DataUnavailable(format!("no grids loaded for '{}'", self.city))),
        }
    }

    pub fn statistics(&self) -> Result<&CityStatistics> {
        self.stats
            .as_deref()
            .ok_or_else(|| HcsError::DataUnavailable(format!("no city statistics for '{}'", self.city)))
    }

    pub fn set_statistics(&mut self, stats: Arc<CityStatistics>) {
        self.stats = Some(stats);
    }

    /// Fresh statistics from the loaded grids, zones and facilities.
    pub fn compute_statistics(&self) -> Result<CityStatistics> {
        if self.grids.is_empty() {
            return Err(HcsError::DataUnavailable(format!(
                "no raster data for '{}' to compute statistics from",
                self.city
            )));
        }
        compute_city_statistics(
            &self.grids,
            self.zones.as_ref(),
            self.facilities.as_ref(),
            &self.accessibility,
        )
    }

    /// Statistics from `cache`, computed and stored on a miss (or when `force` is set).
    pub fn ensure_statistics(&mut self, cache: &dyn StatisticsCache, force: bool) -> Result<Arc<CityStatistics>> {
        let stats = load_or_compute(cache, &self.city, force, || self.compute_statistics())?;
        self.stats = Some(Arc::clone(&stats));
        Ok(stats)
    }

    pub fn climate_surfaces(&self) -> Result<ClimateSurfaces> {
        Ok(ClimateSurfaces {
            temperature: self.require_grid(Layer::Temperature)?.data.clone(),
            pollutant: self.require_grid(Layer::Pollutant)?.data.clone(),
            moisture: self.require_grid(Layer::Moisture)?.data.clone(),
        })
    }

    /// Vulnerability surface; zeros when the layer is absent.
    fn vulnerability_surface(&self) -> Result<Array2<f64>> {
        match self.grid(Layer::Vulnerability) {
            Some(grid) => Ok(grid.data.clone()),
            None => {
                let shape = self.require_grid(Layer::Temperature)?.shape();
                Ok(Array2::zeros(shape))
            }
        }
    }

    /// Zone means of the scored layers plus gravity accessibility.
    /// Without a facility set every zone's accessibility is 0.
    pub fn zone_layer_values(&self) -> Result<Vec<ZoneLayerValues>> {
        let zones = self.zones()?;
        let vegetation = zone_means(self.require_grid(Layer::Vegetation)?, zones)?;
        let temperature = zone_means(self.require_grid(Layer::Temperature)?, zones)?;
        let pollutant = zone_means(self.require_grid(Layer::Pollutant)?, zones)?;
        let accessibility = match &self.facilities {
            Some(facilities) => self.accessibility.scores(zones, facilities)?,
            None => vec![0.0; zones.len()],
        };

        Ok((0..zones.len())
            .map(|i| ZoneLayerValues {
                vegetation: vegetation[i],
                temperature: temperature[i],
                pollutant: pollutant[i],
                accessibility: accessibility[i],
            })
            .collect())
    }

    /// The baseline scored zone table.
    pub fn score_zones(&self) -> Result<Vec<ScoredZone>> {
        let stats = self.statistics()?;
        let zones = self.zones()?;
        let normalizer = StatisticsNormalizer::new(stats);
        let values = self.zone_layer_values()?;

        Ok(zones
            .zones
            .iter()
            .zip(values)
            .map(|(zone, v)| score_zone(zone, v, &normalizer, &SCORING.zone))
            .collect())
    }

    /// HCS spread over the baseline zone table.
    pub fn score_summary(&self) -> Result<ZoneTableSummary> {
        Ok(ZoneTableSummary::of(&self.score_zones()?))
    }

    /// The baseline row of one zone.
    pub fn zone_score(&self, zone_id: &str) -> Result<ScoredZone> {
        self.score_zones()?
            .into_iter()
            .find(|z| z.id == zone_id)
            .ok_or_else(|| HcsError::DataUnavailable(format!("zone '{}' not found in '{}'", zone_id, self.city)))
    }

    pub fn zone_simulator(&self) -> Result<ZoneSimulator<'_>> {
        let mut simulator = ZoneSimulator::new(self.zones()?, self.facilities.as_ref(), self.statistics()?);
        simulator.accessibility = self.accessibility;
        Ok(simulator)
    }

    /// One grid-scoped placement against the current surfaces and coverage.
    pub fn simulate_grid(&self, candidate: &Mask, params: &GridSimulationParams) -> Result<Option<GridSimulationResult>> {
        apply_grid(
            &self.climate_surfaces()?,
            &self.coverage_mask()?,
            candidate,
            &self.require_grid(Layer::Population)?.data,
            &self.vulnerability_surface()?,
            params,
        )
    }

    pub fn optimize(&self, config: OptimizerConfig, params: GridSimulationParams) -> Result<OptimizationResult> {
        GreedyOptimizer::new(config, params).run(
            &self.climate_surfaces()?,
            &self.coverage_mask()?,
            &self.require_grid(Layer::Population)?.data,
            &self.vulnerability_surface()?,
        )
    }
}
