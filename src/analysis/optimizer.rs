use {
    super::{
        coverage::{square_mask, union},
        grid_simulation::apply_grid,
    },
    crate::{
        config::{DF, GridSimulationParams, OptimizerConfig},
        domain::Mask,
        error::{HcsError, Result},
        models::{
            ClimateSurfaces, GridSimulationResult, OptimizationResult, OptimizationStep, ScoreSummary,
        },
        trace_time,
        utils::{nan_mean, nan_to_num, normalize_max},
    },
    itertools::Itertools,
    ndarray::{Array2, Zip},
    rayon::prelude::*,
    std::cmp::Ordering,
};

/// Greedy park placement: each round commits the single best neighbourhood
/// until nothing left improves the equity-adjusted score net of penalties.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyOptimizer {
    pub config: OptimizerConfig,
    pub params: GridSimulationParams,
}

struct Evaluated {
    rank: usize,
    index: usize,
    mask: Mask,
    result: GridSimulationResult,
}

impl GreedyOptimizer {
    pub fn new(config: OptimizerConfig, params: GridSimulationParams) -> Self {
        Self { config, params }
    }

    /// Runs the search on private copies of the inputs.
    pub fn run(
        &self,
        surfaces: &ClimateSurfaces,
        coverage_mask: &Mask,
        population: &Array2<f64>,
        vulnerability: &Array2<f64>,
    ) -> Result<OptimizationResult> {
        let kernel = self.config.kernel_size;
        if kernel % 2 == 0 {
            return Err(HcsError::Validation(format!(
                "kernel size must be a positive odd number, got {}",
                kernel
            )));
        }

        let shape = surfaces.shape();
        if !surfaces.is_consistent()
            || coverage_mask.dim() != shape
            || population.dim() != shape
            || vulnerability.dim() != shape
        {
            return Err(HcsError::Validation(format!(
                "optimizer inputs must all share the temperature shape {:?}",
                shape
            )));
        }

        let mut current = surfaces.clone();
        let mut covered = coverage_mask.clone();
        let mut steps: Vec<OptimizationStep> = Vec::new();

        let baseline = {
            let hcs = super::scoring::grid_hcs(&current, &self.params.weights)?;
            let equity = super::scoring::grid_equity_adjust(&hcs, vulnerability, self.params.equity_weight)?;
            ScoreSummary::of(&hcs, &equity)
        };

        for iteration in 0..self.config.max_iterations {
            // 1 & 2. Highest-demand uncovered cells
            let candidates = self.rank_candidates(population, vulnerability, &covered);

            // 3 & 4. Evaluate every neighbourhood against the current state
            let best = trace_time!("optimizer round", 50_000, {
                self.best_candidate(&candidates, &current, &covered, population, vulnerability)
            });

            // 5 & 6. Stop when nothing valid or nothing worth building
            let Some(best) = best else {
                if DF.log_optimizer {
                    log::info!("Round {}: no valid candidate, stopping", iteration + 1);
                }
                break;
            };
            let diagnostics = best.result.diagnostics;
            if diagnostics.marginal_gain <= 0.0 {
                if DF.log_optimizer {
                    log::info!(
                        "Round {}: best marginal gain {:.4} <= 0, stopping",
                        iteration + 1,
                        diagnostics.marginal_gain
                    );
                }
                break;
            }

            // 7. Commit
            let summary = best.result.summary_after();
            let cols = shape.1;
            steps.push(OptimizationStep {
                index: best.index,
                row: best.index / cols,
                col: best.index % cols,
                equity_delta: diagnostics.mean_equity_delta,
                marginal_gain: diagnostics.marginal_gain,
                coverage_gain: nan_mean(best.result.coverage_gain.iter().copied()),
                maintenance_penalty: diagnostics.maintenance_penalty,
                overlap_penalty: diagnostics.overlap_penalty,
                hcs_mean: summary.hcs_mean,
                equity_mean: summary.equity_mean,
            });
            if DF.log_optimizer {
                log::info!(
                    "Round {}: committed cell {} (rank {}), marginal gain {:.4}",
                    iteration + 1,
                    best.index,
                    best.rank,
                    diagnostics.marginal_gain
                );
            }
            covered = union(&covered, &best.mask);
            current = best.result.surfaces;
        }

        Ok(OptimizationResult {
            optimal_count: steps.len(),
            baseline,
            steps,
        })
    }

    /// Row-major indices of the `candidate_count` highest-demand cells, best first.
    /// Demand is `normalize(population) * (1 + vulnerability)`, zero where covered.
    pub fn rank_candidates(
        &self,
        population: &Array2<f64>,
        vulnerability: &Array2<f64>,
        covered: &Mask,
    ) -> Vec<usize> {
        let weight = normalize_max(population);
        let vuln = nan_to_num(vulnerability, 0.0);
        let demand = Zip::from(&weight)
            .and(&vuln)
            .and(covered)
            .map_collect(|&w, &v, &c| if c { 0.0 } else { w * (1.0 + v) });

        demand
            .iter()
            .copied()
            .enumerate()
            .sorted_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
            .take(self.config.candidate_count)
            .map(|(index, _)| index)
            .collect()
    }

    fn best_candidate(
        &self,
        candidates: &[usize],
        current: &ClimateSurfaces,
        covered: &Mask,
        population: &Array2<f64>,
        vulnerability: &Array2<f64>,
    ) -> Option<Evaluated> {
        let shape = current.shape();
        candidates
            .par_iter()
            .enumerate()
            .filter_map(|(rank, &index)| {
                let mask = square_mask(shape, index, self.config.kernel_size);
                match apply_grid(current, covered, &mask, population, vulnerability, &self.params) {
                    Ok(Some(result)) if !result.diagnostics.marginal_gain.is_nan() => Some(Evaluated {
                        rank,
                        index,
                        mask,
                        result,
                    }),
                    Ok(_) => None,
                    Err(e) => {
                        log::debug!("Skipping candidate {}: {}", index, e);
                        None
                    }
                }
            })
            .reduce_with(|a, b| {
                let (ga, gb) = (a.result.diagnostics.marginal_gain, b.result.diagnostics.marginal_gain);
                if gb > ga || (gb == ga && b.rank < a.rank) { b } else { a }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OPTIMIZER, SIMULATION};

    fn surfaces(shape: (usize, usize)) -> ClimateSurfaces {
        ClimateSurfaces {
            temperature: Array2::from_shape_fn(shape, |(r, c)| 30.0 + (r + c) as f64 * 0.1),
            pollutant: Array2::from_elem(shape, 0.03),
            moisture: Array2::from_elem(shape, 3.0),
        }
    }

    #[test]
    fn test_even_or_zero_kernel_is_rejected() {
        let shape = (6, 6);
        for kernel_size in [0, 2, 4] {
            let optimizer = GreedyOptimizer::new(
                OptimizerConfig {
                    kernel_size,
                    ..OPTIMIZER
                },
                SIMULATION.grid,
            );
            let result = optimizer.run(
                &surfaces(shape),
                &Array2::from_elem(shape, false),
                &Array2::from_elem(shape, 100.0),
                &Array2::zeros(shape),
            );
            assert!(matches!(result, Err(HcsError::Validation(_))), "kernel {}", kernel_size);
        }
    }

    #[test]
    fn test_zero_population_commits_nothing() {
        let shape = (12, 12);
        let result = GreedyOptimizer::default()
            .run(
                &surfaces(shape),
                &Array2::from_elem(shape, false),
                &Array2::zeros(shape),
                &Array2::from_elem(shape, 0.5),
            )
            .unwrap();
        assert_eq!(result.optimal_count, 0);
        assert!(result.steps.is_empty());
    }

    #[test]
    fn test_candidates_skip_covered_cells() {
        let shape = (3, 3);
        let mut pop = Array2::zeros(shape);
        pop[[0, 0]] = 10.0;
        pop[[2, 2]] = 5.0;
        pop[[1, 1]] = 1.0;
        let mut covered = Array2::from_elem(shape, false);
        covered[[0, 0]] = true;
        let optimizer = GreedyOptimizer::new(
            OptimizerConfig {
                candidate_count: 2,
                ..OPTIMIZER
            },
            SIMULATION.grid,
        );
        assert_eq!(optimizer.rank_candidates(&pop, &Array2::zeros(shape), &covered), vec![8, 4]);
    }

    #[test]
    fn test_free_interventions_commit_and_stay_bounded() {
        let shape = (12, 12);
        let params = GridSimulationParams {
            lambda_m: 0.0,
            lambda_o: 0.0,
            ..SIMULATION.grid
        };
        let optimizer = GreedyOptimizer::new(
            OptimizerConfig {
                max_iterations: 3,
                ..OPTIMIZER
            },
            params,
        );
        let pop = Array2::from_shape_fn(shape, |(r, c)| if r < 6 && c < 6 { 1000.0 } else { 10.0 });
        let result = optimizer
            .run(&surfaces(shape), &Array2::from_elem(shape, false), &pop, &Array2::from_elem(shape, 0.3))
            .unwrap();

        assert!(result.optimal_count <= 3);
        assert_eq!(result.optimal_count, result.steps.len());
        for step in &result.steps {
            assert!(step.marginal_gain > 0.0);
            assert_eq!(step.index, step.row * shape.1 + step.col);
        }
    }

    #[test]
    fn test_mismatched_inputs_are_rejected() {
        let shape = (4, 4);
        let err = GreedyOptimizer::default().run(
            &surfaces(shape),
            &Array2::from_elem((2, 2), false),
            &Array2::zeros(shape),
            &Array2::zeros(shape),
        );
        assert!(matches!(err, Err(HcsError::Validation(_))));
    }
}
