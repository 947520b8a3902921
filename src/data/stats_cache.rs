use {
    crate::{
        config::{DF, PERSISTENCE, stats_cache_filename},
        error::Result as HcsResult,
        models::CityStatistics,
        utils::{epoch_ms_to_utc, format_duration, how_many_seconds_ago, now_timestamp_ms},
    },
    anyhow::{Context, Result, anyhow, bail},
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        fs::{self, File},
        io::{BufReader, BufWriter, Write},
        path::PathBuf,
        sync::{Arc, RwLock},
    },
    tempfile::NamedTempFile,
};

/// Where computed city statistics live between requests.
///
/// Values are replaced whole; a reader never sees a partly written entry.
pub trait StatisticsCache: Send + Sync {
    fn get(&self, city: &str) -> Result<Option<Arc<CityStatistics>>>;
    fn put(&self, city: &str, stats: Arc<CityStatistics>) -> Result<()>;
    fn invalidate(&self, city: &str) -> Result<()>;
}

/// Cached statistics for `city`, computing (and storing) them on a miss.
///
/// `force` drops any cached entry first. Cache failures of any kind are logged
/// and fall back to `compute`; only a failing computation is an error.
pub fn load_or_compute<F>(
    cache: &dyn StatisticsCache,
    city: &str,
    force: bool,
    compute: F,
) -> HcsResult<Arc<CityStatistics>>
where
    F: FnOnce() -> HcsResult<CityStatistics>,
{
    if force {
        if let Err(e) = cache.invalidate(city) {
            log::warn!("Could not invalidate statistics for '{}': {:#}", city, e);
        }
    } else {
        match cache.get(city) {
            Ok(Some(stats)) => {
                if DF.log_stats_cache {
                    log::info!("Statistics cache hit for '{}'", city);
                }
                return Ok(stats);
            }
            Ok(None) => {
                if DF.log_stats_cache {
                    log::info!("Statistics cache miss for '{}', computing", city);
                }
            }
            Err(e) => log::warn!("Statistics cache read failed for '{}', recomputing: {:#}", city, e),
        }
    }

    let stats = Arc::new(compute()?);
    if let Err(e) = cache.put(city, Arc::clone(&stats)) {
        log::warn!("Statistics cache write failed for '{}': {:#}", city, e);
    }
    Ok(stats)
}

// --- IN-MEMORY IMPLEMENTATION ---

#[derive(Debug, Default)]
pub struct MemoryStatisticsCache {
    entries: RwLock<HashMap<String, Arc<CityStatistics>>>,
}

impl MemoryStatisticsCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatisticsCache for MemoryStatisticsCache {
    fn get(&self, city: &str) -> Result<Option<Arc<CityStatistics>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("statistics cache lock poisoned"))?;
        Ok(entries.get(city).cloned())
    }

    fn put(&self, city: &str, stats: Arc<CityStatistics>) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| anyhow!("statistics cache lock poisoned"))?
            .insert(city.to_string(), stats);
        Ok(())
    }

    fn invalidate(&self, city: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| anyhow!("statistics cache lock poisoned"))?
            .remove(city);
        Ok(())
    }
}

// --- FILE IMPLEMENTATION ---

/// Binary cache file wrapper with metadata
#[derive(Serialize, Deserialize, Debug)]
struct CacheFile {
    pub version: f64,
    pub timestamp_ms: i64,
    pub city: String,
    pub stats: CityStatistics,
}

/// One bincode blob per city under `directory`.
#[derive(Debug, Clone)]
pub struct FileStatisticsCache {
    directory: PathBuf,
}

impl Default for FileStatisticsCache {
    fn default() -> Self {
        Self::new(PERSISTENCE.stats.directory)
    }
}

impl FileStatisticsCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path_for(&self, city: &str) -> PathBuf {
        self.directory.join(stats_cache_filename(city))
    }
}

impl StatisticsCache for FileStatisticsCache {
    fn get(&self, city: &str) -> Result<Option<Arc<CityStatistics>>> {
        let full_path = self.path_for(city);
        if !full_path.exists() {
            return Ok(None);
        }

        let file = File::open(&full_path).with_context(|| format!("Failed to open file: {:?}", full_path))?;
        let cache: CacheFile = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("Failed to deserialize cache from: {:?}", full_path))?;

        if cache.version != PERSISTENCE.stats.version {
            bail!(
                "Cache version mismatch: file v{} vs required v{}",
                cache.version,
                PERSISTENCE.stats.version
            );
        }
        if cache.city != city {
            bail!("Cache at {:?} belongs to '{}', not '{}'", full_path, cache.city, city);
        }

        if DF.log_stats_cache {
            log::info!(
                "Loaded statistics for '{}' written {} ({} ago)",
                city,
                epoch_ms_to_utc(cache.timestamp_ms),
                format_duration(how_many_seconds_ago(cache.timestamp_ms) * 1000)
            );
        }
        Ok(Some(Arc::new(cache.stats)))
    }

    fn put(&self, city: &str, stats: Arc<CityStatistics>) -> Result<()> {
        let full_path = self.path_for(city);

        let cache = CacheFile {
            version: PERSISTENCE.stats.version,
            timestamp_ms: now_timestamp_ms(),
            city: city.to_string(),
            stats: (*stats).clone(),
        };

        // One temp file per write, next to the target so the rename stays on one filesystem
        fs::create_dir_all(&self.directory)
            .with_context(|| format!("Failed to create directory: {}", self.directory.display()))?;
        let mut tmp = NamedTempFile::new_in(&self.directory)
            .with_context(|| format!("Failed to create temp file in: {}", self.directory.display()))?;
        let tmp_path = tmp.path().to_path_buf();
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            bincode::serialize_into(&mut writer, &cache)
                .with_context(|| format!("Failed to serialize cache to: {}", tmp_path.display()))?;
            writer
                .flush()
                .with_context(|| format!("Failed to flush cache: {}", tmp_path.display()))?;
        }

        // Rename is the commit point; the last writer wins
        tmp.persist(&full_path)
            .with_context(|| format!("Failed to move cache into place: {}", full_path.display()))?;

        if DF.log_stats_cache {
            log::info!("Statistics for '{}' written to {}", city, full_path.display());
        }
        Ok(())
    }

    fn invalidate(&self, city: &str) -> Result<()> {
        let full_path = self.path_for(city);
        match fs::remove_file(&full_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove cache: {}", full_path.display())),
        }
    }
}
