//! Persistent cache tier backed by the filesystem

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::stats::CacheTierStats;
use super::types::{CacheEntry, QueryKey};
use super::CacheStore;
use crate::error::{RecallError, RecallResult};
use async_trait::async_trait;

/// Persistent cache tier
///
/// Stores one JSON file per key under a base directory with an in-memory
/// index, so cached results survive process restarts. Errors surface as
/// `RecallResult` here; the dual-level cache maps them to misses.
#[derive(Debug)]
pub struct L2Cache {
    /// Base directory for cache files
    base_dir: PathBuf,
    /// TTL applied to inserted entries
    default_ttl: Duration,
    /// Index of known entries
    index: Arc<Mutex<HashMap<String, PathBuf>>>,
    /// Statistics
    stats: Arc<Mutex<CacheTierStats>>,
}

impl L2Cache {
    /// Create a new persistent tier rooted at `base_dir`
    pub fn new(base_dir: impl AsRef<Path>, default_ttl: Duration) -> RecallResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        if !base_dir.exists() {
            std::fs::create_dir_all(&base_dir)
                .map_err(|e| RecallError::cache(format!("failed to create cache directory: {}", e)))?;
        }

        Ok(Self {
            base_dir,
            default_ttl,
            index: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(Mutex::new(CacheTierStats::default())),
        })
    }

    /// TTL applied to entries inserted into this tier
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Rebuild the index from files already on disk
    pub async fn initialize(&self) -> RecallResult<()> {
        let mut index = self.index.lock().await;
        let mut stats = self.stats.lock().await;

        index.clear();

        let mut dir = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| RecallError::cache(format!("failed to read cache directory: {}", e)))?;

        while let Some(dir_entry) = dir
            .next_entry()
            .await
            .map_err(|e| RecallError::cache(format!("failed to read directory entry: {}", e)))?
        {
            let path = dir_entry.path();
            let is_file = dir_entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if let Some(key) = name.strip_suffix(".json") {
                    index.insert(key.to_string(), path.clone());
                }
            }
        }

        stats.entries = index.len();
        debug!("L2 cache initialized with {} entries", index.len());
        Ok(())
    }

    /// Get tier statistics
    pub async fn stats(&self) -> CacheTierStats {
        self.stats.lock().await.clone()
    }

    /// Current entry count
    pub async fn len(&self) -> usize {
        self.index.lock().await.len()
    }

    /// Purge entries older than `max_age_days` regardless of TTL
    ///
    /// Bounds storage growth; distinct from TTL expiry. Returns the number of
    /// entries removed. Unreadable or corrupted files count as stale.
    pub async fn cleanup(&self, max_age_days: i64) -> RecallResult<usize> {
        let cutoff = Utc::now() - chrono::Duration::days(max_age_days);

        let mut index = self.index.lock().await;
        let mut stats = self.stats.lock().await;

        let mut stale = Vec::new();
        for (key, path) in index.iter() {
            let is_stale = match fs::read_to_string(path).await {
                Ok(content) => match serde_json::from_str::<CacheEntry>(&content) {
                    Ok(entry) => entry.created_at < cutoff,
                    Err(_) => true,
                },
                Err(_) => true,
            };
            if is_stale {
                stale.push((key.clone(), path.clone()));
            }
        }

        for (key, path) in &stale {
            index.remove(key);
            let _ = fs::remove_file(path).await;
        }

        stats.evictions += stale.len() as u64;
        stats.entries = index.len();
        Ok(stale.len())
    }

    fn file_path(&self, key: &QueryKey) -> PathBuf {
        self.base_dir.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl CacheStore for L2Cache {
    async fn get(&self, key: &QueryKey) -> RecallResult<Option<CacheEntry>> {
        let mut index = self.index.lock().await;
        let mut stats = self.stats.lock().await;

        let path = match index.get(key.as_str()) {
            Some(path) => path.clone(),
            None => {
                stats.misses += 1;
                return Ok(None);
            }
        };

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("L2 read failed for {}: {}", key.as_str(), e);
                stats.misses += 1;
                return Ok(None);
            }
        };

        let mut entry = match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) => entry,
            Err(e) => {
                // Corrupted entry, drop it
                warn!("removing corrupted L2 entry {}: {}", key.as_str(), e);
                index.remove(key.as_str());
                stats.misses += 1;
                stats.entries = index.len();
                let _ = fs::remove_file(&path).await;
                return Ok(None);
            }
        };

        if entry.is_expired() {
            index.remove(key.as_str());
            stats.expirations += 1;
            stats.misses += 1;
            stats.entries = index.len();
            let _ = fs::remove_file(&path).await;
            return Ok(None);
        }

        // Best-effort persisted hit counter: a failed write-back must not
        // fail the read.
        entry.mark_hit();
        match serde_json::to_string_pretty(&entry) {
            Ok(serialized) => {
                if let Err(e) = fs::write(&path, serialized).await {
                    debug!("hit counter write-back failed for {}: {}", key.as_str(), e);
                }
            }
            Err(e) => debug!("hit counter serialization failed: {}", e),
        }

        stats.hits += 1;
        Ok(Some(entry))
    }

    async fn set(&self, key: QueryKey, entry: CacheEntry) -> RecallResult<()> {
        let path = self.file_path(&key);
        let serialized = serde_json::to_string_pretty(&entry)?;
        fs::write(&path, serialized).await?;

        let mut index = self.index.lock().await;
        let mut stats = self.stats.lock().await;
        index.insert(key.into_inner(), path);
        stats.inserts += 1;
        stats.entries = index.len();
        Ok(())
    }

    async fn invalidate(&self) -> RecallResult<()> {
        let mut index = self.index.lock().await;
        let mut stats = self.stats.lock().await;

        for path in index.values() {
            let _ = fs::remove_file(path).await;
        }
        index.clear();
        stats.entries = 0;
        Ok(())
    }
}
