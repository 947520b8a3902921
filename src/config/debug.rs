//! Debugging feature flags.

#[allow(dead_code)]
pub struct LogFlags {
    /// Activate trace_time macro (for cool scope-level timing)
    pub log_performance: bool,

    /// Per-zone masking details (cell counts, reprojection)
    pub log_zonal: bool,

    pub log_accessibility: bool,

    /// Zone-scoped action application (affected zones, deltas)
    pub log_simulation: bool,

    /// Candidate evaluation and commits in the greedy search
    pub log_optimizer: bool,

    /// Statistics cache hits, misses and fallbacks
    pub log_stats_cache: bool,

    pub log_scenario: bool,
}

pub const DF: LogFlags = LogFlags {
    log_performance: false,

    log_zonal: false,
    log_accessibility: false,

    log_simulation: true,
    log_optimizer: true,
    log_stats_cache: true,
    log_scenario: true,
};
