//! In-memory cache tier

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::stats::CacheTierStats;
use super::types::{CacheEntry, QueryKey};
use super::CacheStore;
use crate::error::RecallResult;
use async_trait::async_trait;

/// In-memory cache tier with lazy TTL expiry
///
/// Eviction at capacity removes the single oldest-`created_at` entry. This is
/// FIFO-by-insertion rather than true LRU: access times are not tracked.
#[derive(Debug)]
pub struct L1Cache {
    /// Maximum number of entries
    max_entries: usize,
    /// TTL applied to inserted entries
    default_ttl: Duration,
    /// Cache entries keyed by digest
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    /// Statistics
    stats: Arc<RwLock<CacheTierStats>>,
}

impl L1Cache {
    /// Create a new in-memory tier
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            max_entries,
            default_ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(CacheTierStats::default())),
        }
    }

    /// TTL applied to entries inserted into this tier
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Current entry count
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the tier is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Get tier statistics
    pub async fn stats(&self) -> CacheTierStats {
        self.stats.read().await.clone()
    }

    /// Remove all expired entries, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired());
        let removed = before - entries.len();

        let mut stats = self.stats.write().await;
        stats.expirations += removed as u64;
        stats.entries = entries.len();
        removed
    }

    /// Evict the entry with the oldest `created_at`
    fn evict_oldest(entries: &mut HashMap<String, CacheEntry>) -> bool {
        let oldest_key = entries
            .iter()
            .min_by_key(|(_, e)| e.created_at)
            .map(|(k, _)| k.clone());

        match oldest_key {
            Some(key) => {
                entries.remove(&key);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CacheStore for L1Cache {
    async fn get(&self, key: &QueryKey) -> RecallResult<Option<CacheEntry>> {
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        let expired = matches!(entries.get(key.as_str()), Some(e) if e.is_expired());
        if expired {
            entries.remove(key.as_str());
            stats.expirations += 1;
            stats.misses += 1;
            stats.entries = entries.len();
            return Ok(None);
        }

        if let Some(entry) = entries.get_mut(key.as_str()) {
            entry.mark_hit();
            stats.hits += 1;
            Ok(Some(entry.clone()))
        } else {
            stats.misses += 1;
            Ok(None)
        }
    }

    async fn set(&self, key: QueryKey, entry: CacheEntry) -> RecallResult<()> {
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        if !entries.contains_key(key.as_str()) && entries.len() >= self.max_entries {
            if Self::evict_oldest(&mut entries) {
                stats.evictions += 1;
            }
        }

        entries.insert(key.into_inner(), entry);
        stats.inserts += 1;
        stats.entries = entries.len();
        Ok(())
    }

    async fn invalidate(&self) -> RecallResult<()> {
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;
        entries.clear();
        stats.entries = 0;
        Ok(())
    }
}
