use serde::{Deserialize, Serialize};

/// Greedy placement search settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Highest-demand cells evaluated per round
    pub candidate_count: usize,
    pub max_iterations: usize,
    /// Side of the square neighbourhood placed per candidate (odd)
    pub kernel_size: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OPTIMIZER
    }
}

pub const OPTIMIZER: OptimizerConfig = OptimizerConfig {
    candidate_count: 25,
    max_iterations: 12,
    kernel_size: 3,
};
