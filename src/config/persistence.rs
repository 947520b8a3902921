//! File persistence and serialization configuration

/// Configuration for the city statistics cache
pub struct StatsPersistenceConfig {
    /// Directory path for storing cached statistics blobs
    pub directory: &'static str,
    /// Base filename for statistics files (without extension)
    pub filename_base: &'static str,
    /// Current version of the statistics serialization format
    pub version: f64,
}

/// The Master Persistence Configuration
pub struct PersistenceConfig {
    pub stats: StatsPersistenceConfig,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    stats: StatsPersistenceConfig {
        directory: "stats_cache",
        filename_base: "city_stats",
        version: 1.0,
    },
};

/// Generate city-specific cache filename
/// Example: "city_stats_chicago_v1.bin"
pub fn stats_cache_filename(city: &str) -> String {
    // Slugs only; anything else could escape the cache directory
    let slug: String = city
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "{}_{}_v{}.bin",
        PERSISTENCE.stats.filename_base, slug, PERSISTENCE.stats.version
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_is_slugged() {
        assert_eq!(stats_cache_filename("Chicago"), "city_stats_chicago_v1.bin");
        assert_eq!(stats_cache_filename("../etc"), "city_stats____etc_v1.bin");
    }
}
