//! Dual-level query caching
//!
//! Caches query results in two tiers: a fast in-memory tier (L1) and a
//! persistent tier (L2) that survives process restarts. Reads go through L1
//! first and promote L2 hits; writes go through to both tiers. Caching is a
//! performance optimization only: every storage failure degrades to a miss
//! and never reaches the caller.

pub mod config;
pub mod l1;
pub mod l2;
pub mod stats;
pub mod types;


pub use config::QueryCacheConfig;
pub use l1::L1Cache;
pub use l2::L2Cache;
pub use stats::{CacheTierStats, DualCacheStats};
pub use types::{CacheEntry, QueryKey};

use crate::error::RecallResult;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Storage interface shared by both cache tiers
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get an entry, applying lazy TTL expiry and hit accounting
    async fn get(&self, key: &QueryKey) -> RecallResult<Option<CacheEntry>>;

    /// Insert an entry
    async fn set(&self, key: QueryKey, entry: CacheEntry) -> RecallResult<()>;

    /// Clear all entries
    async fn invalidate(&self) -> RecallResult<()>;
}

/// Two-tier read-through / write-through query cache
///
/// On a double miss the caller performs the fresh fetch itself and stores the
/// result back via [`set`](DualLevelCache::set). Invalidation after writes to
/// the underlying data is also the caller's responsibility.
#[derive(Debug)]
pub struct DualLevelCache {
    /// In-memory tier
    l1: L1Cache,
    /// Persistent tier, if enabled
    l2: Option<L2Cache>,
    /// Configuration
    config: QueryCacheConfig,
}

impl DualLevelCache {
    /// Create a new dual-level cache
    pub fn new(config: QueryCacheConfig) -> RecallResult<Self> {
        let l1 = L1Cache::new(config.l1_max_entries, config.l1_ttl);
        let l2 = if config.enable_l2 {
            Some(L2Cache::new(&config.l2_dir, config.l2_ttl)?)
        } else {
            None
        };

        Ok(Self { l1, l2, config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> RecallResult<Self> {
        Self::new(QueryCacheConfig::default())
    }

    /// Rescan the persistent tier for entries left by a previous process
    ///
    /// A scan failure leaves the L2 index empty, which only costs misses.
    pub async fn initialize(&self) {
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.initialize().await {
                warn!("L2 cache scan failed, starting cold: {}", e);
            }
        }
    }

    /// Look up a cached result
    pub async fn get(&self, query: &str, params: &serde_json::Value) -> Option<serde_json::Value> {
        self.get_with_context(query, params, None).await
    }

    /// Look up a cached result with additional context fields in the key
    pub async fn get_with_context(
        &self,
        query: &str,
        params: &serde_json::Value,
        context: Option<&serde_json::Value>,
    ) -> Option<serde_json::Value> {
        let key = QueryKey::new(query, params, context);

        match self.l1.get(&key).await {
            Ok(Some(entry)) => return Some(entry.value),
            Ok(None) => {}
            Err(e) => warn!("L1 get failed, treating as miss: {}", e),
        }

        let l2 = self.l2.as_ref()?;
        match l2.get(&key).await {
            Ok(Some(entry)) => {
                // Promote so the next read is an L1 hit
                let value = entry.value.clone();
                if let Err(e) = self.l1.set(key, entry).await {
                    warn!("L1 promotion failed: {}", e);
                }
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("L2 get failed, treating as miss: {}", e);
                None
            }
        }
    }

    /// Store a fresh result in both tiers (write-through)
    pub async fn set(&self, query: &str, params: &serde_json::Value, result: serde_json::Value) {
        self.set_with_context(query, params, None, result).await
    }

    /// Store a fresh result with additional context fields in the key
    pub async fn set_with_context(
        &self,
        query: &str,
        params: &serde_json::Value,
        context: Option<&serde_json::Value>,
        result: serde_json::Value,
    ) {
        let size = result.to_string().len();
        if size > self.config.max_entry_size {
            debug!("skipping cache write, payload {} bytes exceeds limit", size);
            return;
        }

        let key = QueryKey::new(query, params, context);

        let l1_entry = CacheEntry::new(result.clone(), self.config.l1_ttl);
        if let Err(e) = self.l1.set(key.clone(), l1_entry).await {
            warn!("L1 set failed: {}", e);
        }

        if let Some(l2) = &self.l2 {
            let l2_entry = CacheEntry::new(result, self.config.l2_ttl);
            if let Err(e) = l2.set(key, l2_entry).await {
                warn!("L2 set failed, entry will not survive restart: {}", e);
            }
        }
    }

    /// Clear both tiers
    ///
    /// Must be called after any write to the underlying data that could make
    /// cached results stale.
    pub async fn invalidate(&self) {
        if let Err(e) = self.l1.invalidate().await {
            warn!("L1 invalidation failed: {}", e);
        }
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.invalidate().await {
                warn!("L2 invalidation failed: {}", e);
            }
        }
        debug!("query cache invalidated");
    }

    /// Purge L2 entries older than `max_age_days`, returning how many were removed
    pub async fn cleanup(&self, max_age_days: i64) -> usize {
        match &self.l2 {
            Some(l2) => match l2.cleanup(max_age_days).await {
                Ok(removed) => removed,
                Err(e) => {
                    warn!("L2 cleanup failed: {}", e);
                    0
                }
            },
            None => 0,
        }
    }

    /// Get combined statistics for both tiers
    pub async fn get_stats(&self) -> DualCacheStats {
        DualCacheStats {
            l1: self.l1.stats().await,
            l2: match &self.l2 {
                Some(l2) => Some(l2.stats().await),
                None => None,
            },
        }
    }

    /// The cache configuration
    pub fn config(&self) -> &QueryCacheConfig {
        &self.config
    }

    /// TTL of the L1 tier, used as the age bound for freshness heuristics
    pub fn l1_ttl(&self) -> Duration {
        self.config.l1_ttl
    }
}
