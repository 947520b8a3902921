#![allow(clippy::collapsible_if)]
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types outside of crate (for the binaries)
pub use config::PERSISTENCE;
pub use engine::{CityContext, simulate_actions};
pub use error::{HcsError, Result};

// CLI argument parsing
use {
    clap::{Args, Parser, Subcommand},
    config::{GridSimulationParams, OptimizerConfig, SIMULATION},
    geo::{Geometry, Point},
    models::ActionRequest,
    std::path::PathBuf,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Healthy City Score engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Directory for cached city statistics
    #[arg(long, global = true, default_value = PERSISTENCE.stats.directory)]
    pub cache_dir: PathBuf,

    /// Recompute city statistics even when cached
    #[arg(long, global = true, default_value_t = false)]
    pub force_stats: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Baseline zone scores
    Score {
        /// Show a single zone by id
        #[arg(long)]
        zone: Option<String>,
    },
    /// City-wide layer statistics
    Stats,
    /// List the intervention catalog
    Actions,
    /// Apply zone-scoped actions, e.g. `--action add_park@-87.65,41.95`
    Simulate {
        /// `kind@x,y` with the point in the zone set's coordinates
        #[arg(long = "action")]
        actions: Vec<String>,
        /// JSON file holding an array of action requests
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Place one square of new green space on the grid
    SimulateGrid {
        #[arg(long)]
        row: usize,
        #[arg(long)]
        col: usize,
        /// Side of the square in cells
        #[arg(long, default_value_t = config::OPTIMIZER.kernel_size)]
        kernel: usize,
        #[command(flatten)]
        params: GridArgs,
    },
    /// Greedy placement search
    Optimize {
        #[arg(long, default_value_t = config::OPTIMIZER.candidate_count)]
        candidates: usize,
        #[arg(long, default_value_t = config::OPTIMIZER.max_iterations)]
        iterations: usize,
        #[arg(long, default_value_t = config::OPTIMIZER.kernel_size)]
        kernel: usize,
        #[command(flatten)]
        params: GridArgs,
    },
}

/// Overrides for the grid simulation parameters.
#[derive(Args, Debug, Clone, Default)]
pub struct GridArgs {
    /// Cell edge in metres; defaults to the raster's own cell size
    #[arg(long)]
    pub pixel_size: Option<f64>,
    #[arg(long)]
    pub service_radius: Option<f64>,
    #[arg(long)]
    pub max_cooling: Option<f64>,
    #[arg(long)]
    pub heat_decay_radius: Option<f64>,
    #[arg(long)]
    pub max_reduction_fraction: Option<f64>,
    #[arg(long)]
    pub pollutant_decay_radius: Option<f64>,
    #[arg(long)]
    pub lambda_m: Option<f64>,
    #[arg(long)]
    pub lambda_o: Option<f64>,
}

impl GridArgs {
    /// Defaults from config, then the raster cell size, then explicit flags.
    pub fn resolve(&self, raster_pixel_size: Option<f64>) -> GridSimulationParams {
        let mut p = SIMULATION.grid;
        if let Some(px) = self.pixel_size.or(raster_pixel_size) {
            p.pixel_size = px;
        }
        let overrides = [
            (self.service_radius, &mut p.service_radius),
            (self.max_cooling, &mut p.max_cooling),
            (self.heat_decay_radius, &mut p.heat_decay_radius),
            (self.max_reduction_fraction, &mut p.max_reduction_fraction),
            (self.pollutant_decay_radius, &mut p.pollutant_decay_radius),
            (self.lambda_m, &mut p.lambda_m),
            (self.lambda_o, &mut p.lambda_o),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                *slot = v;
            }
        }
        p
    }
}

pub fn optimizer_config(candidates: usize, iterations: usize, kernel: usize) -> OptimizerConfig {
    OptimizerConfig {
        candidate_count: candidates,
        max_iterations: iterations,
        kernel_size: kernel,
    }
}

/// Parses `kind` or `kind@x,y` into a request.
pub fn parse_action_arg(arg: &str) -> anyhow::Result<ActionRequest> {
    let (kind, geometry) = match arg.split_once('@') {
        None => (arg, None),
        Some((kind, coords)) => {
            let (x, y) = coords
                .split_once(',')
                .ok_or_else(|| anyhow::anyhow!("expected 'x,y' after '@' in '{}'", arg))?;
            let point = Point::new(x.trim().parse::<f64>()?, y.trim().parse::<f64>()?);
            (kind, Some(Geometry::Point(point)))
        }
    };
    Ok(ActionRequest::new(kind.trim(), geometry))
}
