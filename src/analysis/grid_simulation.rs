use {
    super::{
        coverage::{coverage_surface, decay_surface, difference, distance_to_nearest, union},
        scoring::{grid_equity_adjust, grid_hcs},
    },
    crate::{
        config::GridSimulationParams,
        domain::Mask,
        error::{HcsError, Result},
        models::{ClimateSurfaces, GridDiagnostics, GridSimulationResult},
        utils::{nan_mean, nan_to_num, normalize_max},
    },
    ndarray::{Array2, Zip},
};

/// Demand surface and the coverage it was computed against:
/// `need = normalize(population) * (1 + vulnerability) * (1 - coverage(mask))`.
/// NaN vulnerability counts as 0.
pub fn need_surface(
    population: &Array2<f64>,
    vulnerability: &Array2<f64>,
    coverage_mask: &Mask,
    params: &GridSimulationParams,
) -> (Array2<f64>, Array2<f64>) {
    let coverage = coverage_surface(coverage_mask, params.pixel_size, params.service_radius);
    let weight = normalize_max(population);
    let vuln = nan_to_num(vulnerability, 0.0);
    let need = Zip::from(&weight)
        .and(&vuln)
        .and(&coverage)
        .map_collect(|&w, &v, &c| w * (1.0 + v) * (1.0 - c));
    (need, coverage)
}

/// Places one park-like intervention on the cells of `candidate` and scores the outcome.
///
/// Returns `Ok(None)` when every candidate cell is already covered. All inputs
/// must share one shape.
pub fn apply_grid(
    current: &ClimateSurfaces,
    coverage_mask: &Mask,
    candidate: &Mask,
    population: &Array2<f64>,
    vulnerability: &Array2<f64>,
    params: &GridSimulationParams,
) -> Result<Option<GridSimulationResult>> {
    check_shapes(current, coverage_mask, candidate, population, vulnerability)?;

    // 1. Only cells not already served count
    let net_new = difference(candidate, coverage_mask);
    if !net_new.iter().any(|&m| m) {
        return Ok(None);
    }

    // 2 & 3. Coverage and need before the placement
    let (need, coverage_before) = need_surface(population, vulnerability, coverage_mask, params);

    // 4. Cooling, strongest at the new cells
    let distance_new = distance_to_nearest(&net_new);
    let heat_kernel = decay_surface(&distance_new, params.pixel_size, params.heat_decay_radius);
    let delta_temperature = Zip::from(&heat_kernel)
        .and(&need)
        .map_collect(|&k, &n| (-params.max_cooling * k * n).clamp(params.temperature_floor, 0.0));

    // 5. Pollutant reduction, never below a fixed fraction of the original value
    let pollutant_kernel = decay_surface(&distance_new, params.pixel_size, params.pollutant_decay_radius);
    let delta_pollutant = Zip::from(&current.pollutant)
        .and(&pollutant_kernel)
        .and(&need)
        .map_collect(|&p, &k, &n| {
            let delta = -params.max_reduction_fraction * p * k * n;
            let floor = -params.pollutant_floor_fraction * p;
            if delta.is_nan() || floor.is_nan() {
                f64::NAN
            } else {
                delta.max(floor)
            }
        });

    // 6. New surfaces; moisture is untouched
    let surfaces = ClimateSurfaces {
        temperature: &current.temperature + &delta_temperature,
        pollutant: &current.pollutant + &delta_pollutant,
        moisture: current.moisture.clone(),
    };

    // 7. Coverage after the union
    let coverage_mask_after = union(coverage_mask, &net_new);
    let coverage_after = coverage_surface(&coverage_mask_after, params.pixel_size, params.service_radius);
    let coverage_gain = &coverage_after - &coverage_before;

    // 8. Scores before and after
    let hcs_before = grid_hcs(current, &params.weights)?;
    let hcs_after = grid_hcs(&surfaces, &params.weights)?;
    let equity_before = grid_equity_adjust(&hcs_before, vulnerability, params.equity_weight)?;
    let equity_after = grid_equity_adjust(&hcs_after, vulnerability, params.equity_weight)?;
    let mean_equity_delta = nan_mean((&equity_after - &equity_before).iter().copied());

    // 9. Penalties and net benefit
    let mean_gain = nan_mean(coverage_gain.iter().map(|&g| g.clamp(0.0, 1.0)));
    let maintenance_penalty = params.lambda_m;
    let overlap_penalty = params.lambda_o * mean_gain;
    let marginal_gain = mean_equity_delta - maintenance_penalty - overlap_penalty;

    log::debug!(
        "Grid placement: {} new cells, equity delta {:.4}, marginal gain {:.4}",
        net_new.iter().filter(|&&m| m).count(),
        mean_equity_delta,
        marginal_gain
    );

    // 10.
    Ok(Some(GridSimulationResult {
        surfaces,
        delta_temperature,
        delta_pollutant,
        net_new,
        coverage_mask: coverage_mask_after,
        coverage_before,
        coverage_after,
        coverage_gain,
        hcs_before,
        hcs_after,
        equity_before,
        equity_after,
        diagnostics: GridDiagnostics {
            mean_equity_delta,
            maintenance_penalty,
            overlap_penalty,
            coverage_gain: mean_gain,
            marginal_gain,
        },
    }))
}

fn check_shapes(
    current: &ClimateSurfaces,
    coverage_mask: &Mask,
    candidate: &Mask,
    population: &Array2<f64>,
    vulnerability: &Array2<f64>,
) -> Result<()> {
    let shape = current.shape();
    let shapes = [
        ("pollutant", current.pollutant.dim()),
        ("moisture", current.moisture.dim()),
        ("coverage mask", coverage_mask.dim()),
        ("candidate mask", candidate.dim()),
        ("population", population.dim()),
        ("vulnerability", vulnerability.dim()),
    ];
    match shapes.iter().find(|(_, s)| *s != shape) {
        Some((name, s)) => Err(HcsError::Validation(format!(
            "{} shape {:?} does not match temperature shape {:?}",
            name, s, shape
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::coverage::square_mask, config::SIMULATION};

    fn uniform(shape: (usize, usize)) -> ClimateSurfaces {
        ClimateSurfaces {
            temperature: Array2::from_elem(shape, 20.0),
            pollutant: Array2::from_elem(shape, 0.02),
            moisture: Array2::from_elem(shape, 3.0),
        }
    }

    #[test]
    fn test_candidate_inside_coverage_is_noop() {
        let shape = (8, 8);
        let covered = square_mask(shape, 27, 3);
        let candidate = square_mask(shape, 27, 1);
        let result = apply_grid(
            &uniform(shape),
            &covered,
            &candidate,
            &Array2::from_elem(shape, 100.0),
            &Array2::zeros(shape),
            &SIMULATION.grid,
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_uniform_city_cools_and_pays_penalties() {
        let shape = (10, 10);
        let params = SIMULATION.grid;
        let covered = Array2::from_elem(shape, false);
        let candidate = square_mask(shape, 44, 3);
        let result = apply_grid(
            &uniform(shape),
            &covered,
            &candidate,
            &Array2::from_elem(shape, 500.0),
            &Array2::from_elem(shape, 0.5),
            &params,
        )
        .unwrap()
        .unwrap();

        assert!(result.delta_temperature[[4, 4]] < 0.0);
        assert!(result.delta_temperature.iter().all(|&d| (-2.0..=0.0).contains(&d)));
        assert!(result.delta_pollutant.iter().all(|&d| d >= -0.1 * 0.02 - 1e-15));
        assert_eq!(result.surfaces.moisture, Array2::from_elem(shape, 3.0));
        assert!(result.hcs_before.iter().all(|&v| v == 100.0));

        let d = result.diagnostics;
        assert_eq!(d.maintenance_penalty, params.lambda_m);
        assert!((d.overlap_penalty - params.lambda_o * d.coverage_gain).abs() < 1e-12);
        let expected = d.mean_equity_delta - params.lambda_m - params.lambda_o * d.coverage_gain;
        assert!((d.marginal_gain - expected).abs() < 1e-12);
        assert_eq!(result.coverage_mask.iter().filter(|&&m| m).count(), 9);
    }

    #[test]
    fn test_negated_deltas_restore_scores() {
        let shape = (6, 6);
        let mut base = uniform(shape);
        base.temperature[[0, 0]] = 25.0;
        base.pollutant[[5, 5]] = 0.05;
        let vuln = Array2::from_elem(shape, 0.2);
        let result = apply_grid(
            &base,
            &Array2::from_elem(shape, false),
            &square_mask(shape, 14, 3),
            &Array2::from_elem(shape, 1000.0),
            &vuln,
            &SIMULATION.grid,
        )
        .unwrap()
        .unwrap();

        let restored = ClimateSurfaces {
            temperature: &result.surfaces.temperature - &result.delta_temperature,
            pollutant: &result.surfaces.pollutant - &result.delta_pollutant,
            moisture: result.surfaces.moisture.clone(),
        };
        let again = grid_hcs(&restored, &SIMULATION.grid.weights).unwrap();
        for (a, b) in again.iter().zip(result.hcs_before.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shape_mismatch_is_validation_error() {
        let shape = (4, 4);
        let err = apply_grid(
            &uniform(shape),
            &Array2::from_elem(shape, false),
            &square_mask(shape, 5, 3),
            &Array2::zeros((3, 3)),
            &Array2::zeros(shape),
            &SIMULATION.grid,
        );
        assert!(matches!(err, Err(HcsError::Validation(_))));
    }

    #[test]
    fn test_need_ignores_nan_vulnerability() {
        let shape = (2, 2);
        let mut vuln = Array2::zeros(shape);
        vuln[[0, 0]] = f64::NAN;
        let (need, coverage) = need_surface(
            &Array2::from_elem(shape, 10.0),
            &vuln,
            &Array2::from_elem(shape, false),
            &SIMULATION.grid,
        );
        assert!(coverage.iter().all(|&c| c == 0.0));
        assert!(need.iter().all(|&n| (n - 1.0).abs() < 1e-6));
    }
}
