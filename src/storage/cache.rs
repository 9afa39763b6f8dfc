//! File-backed result cache.
//!
//! Each entry is one JSON file named after its key, holding the value along
//! with `cached_at` and `ttl_seconds`. Expired, unreadable or corrupt entries
//! count as misses. Writes go through a temp file and a rename so readers
//! never observe a partial entry.
//!
//! Keys carry a prefix per result kind so a ledger mutation can drop every
//! derived result at once with [`ResultCache::invalidate_derived`].
//!
//! Results are only valid for the ledger they were computed from. Commands
//! build their cache with [`ResultCache::for_database`], which nests entries
//! under a directory named by [`database_scope`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::core::models::CalculationParams;
use crate::core::month::MonthKey;
use crate::core::query::RecordFilter;
use crate::error::Result;

/// Default entry lifetime: one day.
pub const DEFAULT_TTL_MINUTES: u64 = 1440;

/// Prefix of cached forecast results.
pub const FORECAST_PREFIX: &str = "forecast_";
/// Prefix of cached product cost calculations.
pub const PRODUCT_CALCULATION_PREFIX: &str = "product_calculation_";

const ENTRY_EXTENSION: &str = "json";

/// A cached value with its freshness window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    pub cached_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub value: T,
}

impl<T> CacheEntry<T> {
    /// Age of the entry; zero if the clock went backwards.
    #[must_use]
    pub fn age(&self) -> Duration {
        (Utc::now() - self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.age().as_secs() < self.ttl_seconds
    }
}

/// Cache-aside store for computed results.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
    ttl: Duration,
    enabled: bool,
}

impl ResultCache {
    /// A cache rooted at `dir`. The directory is created lazily on first write.
    #[must_use]
    pub const fn new(dir: PathBuf, ttl_minutes: u64) -> Self {
        Self {
            dir,
            ttl: Duration::from_secs(ttl_minutes.saturating_mul(60)),
            enabled: true,
        }
    }

    /// A cache under `root` holding only results derived from `database`.
    #[must_use]
    pub fn for_database(root: &Path, database: &Path, ttl_minutes: u64) -> Self {
        Self::new(root.join(database_scope(database)), ttl_minutes)
    }

    /// A cache that never stores or returns anything.
    #[must_use]
    pub const fn disabled(dir: PathBuf) -> Self {
        Self {
            dir,
            ttl: Duration::ZERO,
            enabled: false,
        }
    }

    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `key`. Characters outside `[A-Za-z0-9_.-]` become `_`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.{ENTRY_EXTENSION}"))
    }

    /// Fresh value for `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }

        let path = self.path_for(key);
        let content = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        if entry.is_fresh() {
            tracing::debug!(key, "Cache hit");
            Some(entry.value)
        } else {
            tracing::debug!(key, "Cache entry expired");
            None
        }
    }

    /// Store `value` under `key`.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, the value cannot
    /// be serialized, or the file cannot be written.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = CacheEntry {
            key: key.to_string(),
            cached_at: Utc::now(),
            ttl_seconds: self.ttl.as_secs(),
            value,
        };
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string(&entry)?;
        write_atomic(&self.path_for(key), content.as_bytes())?;
        Ok(())
    }

    /// Return the cached value for `key` or compute and store it.
    ///
    /// A failed store is logged and does not fail the computation.
    ///
    /// # Errors
    /// Returns any error from `compute`.
    pub fn remember<T, F>(&self, key: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = compute()?;
        if let Err(e) = self.put(key, &value) {
            tracing::warn!(key, error = %e, "Failed to write cache entry");
        }
        Ok(value)
    }

    /// Delete every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    /// Returns an error if an entry cannot be deleted.
    pub fn invalidate_prefix(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;
        for (key, path) in self.entries() {
            if key.starts_with(prefix) {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(prefix, removed, "Invalidated cache entries");
        }
        Ok(removed)
    }

    /// Drop every forecast and product calculation.
    ///
    /// # Errors
    /// Returns an error if an entry cannot be deleted.
    pub fn invalidate_derived(&self) -> Result<usize> {
        Ok(self.invalidate_prefix(FORECAST_PREFIX)?
            + self.invalidate_prefix(PRODUCT_CALCULATION_PREFIX)?)
    }

    /// Delete every entry.
    ///
    /// # Errors
    /// Returns an error if an entry cannot be deleted.
    pub fn clear_all(&self) -> Result<usize> {
        self.invalidate_prefix("")
    }

    /// Keys of all stored entries, sorted.
    #[must_use]
    pub fn list_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries().into_iter().map(|(key, _)| key).collect();
        keys.sort();
        keys
    }

    fn entries(&self) -> Vec<(String, PathBuf)> {
        std::fs::read_dir(&self.dir)
            .ok()
            .into_iter()
            .flatten()
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension() == Some(ENTRY_EXTENSION.as_ref()))
            .filter_map(|path| {
                let key = path.file_stem()?.to_str()?.to_string();
                Some((key, path))
            })
            .collect()
    }
}

/// Directory name for results derived from the ledger at `database`.
///
/// The name is `db-` plus the first 8 bytes of a SHA-256 over the database
/// path with its parent directory canonicalized, so `./ledger.db` and
/// `/abs/ledger.db` share a scope whether or not the file exists yet.
#[must_use]
pub fn database_scope(database: &Path) -> String {
    let path = canonical_database_path(database);
    let mut hasher = Sha256::new();
    hasher.update(path.as_os_str().as_encoded_bytes());
    let digest = hasher.finalize();
    format!("db-{}", hex::encode(&digest[..8]))
}

fn canonical_database_path(database: &Path) -> PathBuf {
    let absolute = std::path::absolute(database).unwrap_or_else(|_| database.to_path_buf());
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map_or_else(|_| absolute.clone(), |parent| parent.join(name)),
        _ => absolute,
    }
}

/// Key of a forecast result.
///
/// Unseeded runs share one entry per parameter set, so repeated calls within
/// the TTL return the same jitter.
#[must_use]
pub fn forecast_key(
    as_of: MonthKey,
    months_ahead: u32,
    filter: &RecordFilter,
    seed: Option<u64>,
) -> String {
    let period = filter.period.map_or("all", |p| p.as_str());
    let category = filter
        .category_id
        .map_or_else(|| "all".to_string(), |id| id.to_string());
    let seed = seed.map_or_else(|| "random".to_string(), |s| s.to_string());
    format!("{FORECAST_PREFIX}{as_of}_{months_ahead}_{period}_{category}_{seed}")
}

/// Key of a product cost calculation.
#[must_use]
pub fn product_calculation_key(product_id: i64, params: &CalculationParams) -> String {
    let part = |value: Option<u32>| value.map_or_else(|| "default".to_string(), |v| v.to_string());
    format!(
        "{PRODUCT_CALCULATION_PREFIX}{product_id}_{}_{}",
        part(params.user_count),
        part(params.resource_units)
    )
}

/// Write bytes atomically using temp file + rename.
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("entry"),
        std::process::id()
    ));

    {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }

    std::fs::rename(&temp_path, path)
}
