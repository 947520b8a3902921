mod demo_city;
mod stats_cache;

pub use {
    demo_city::{demo_context, demo_facilities, demo_grids, demo_zones},
    stats_cache::{FileStatisticsCache, MemoryStatisticsCache, StatisticsCache, load_or_compute},
};
