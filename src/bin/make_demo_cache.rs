use anyhow::{Context, Result};
use healthy_city::config::{DEMO, PERSISTENCE};
use healthy_city::data::{FileStatisticsCache, StatisticsCache, demo_context};

fn main() -> Result<()> {
    // 1. Setup Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let directory = std::env::args().nth(1).unwrap_or_else(|| PERSISTENCE.stats.directory.to_string());
    log::info!("Building statistics cache for '{}' into {}", DEMO.city, directory);

    // 2. Synthetic city
    let ctx = demo_context().context("Failed to build the demo city")?;

    // 3. Compute fresh, never from an older cache file
    let stats = ctx.compute_statistics().context("Failed to compute demo statistics")?;
    for (layer, s) in &stats.layers {
        log::info!("   {:<14} mean {:>10.4}  std {:>10.4}  n {}", layer.to_string(), s.mean, s.std, s.count);
    }

    // 4. Save
    let cache = FileStatisticsCache::new(&directory);
    cache.put(DEMO.city, std::sync::Arc::new(stats))?;
    log::info!("Wrote {:?}", cache.path_for(DEMO.city));

    Ok(())
}
