//! Cache statistics

use serde::{Deserialize, Serialize};

/// Statistics for a single cache tier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheTierStats {
    /// Entries currently stored
    pub entries: usize,
    /// Cache hits
    pub hits: u64,
    /// Cache misses
    pub misses: u64,
    /// Insertions
    pub inserts: u64,
    /// Capacity evictions
    pub evictions: u64,
    /// TTL expirations observed at read time
    pub expirations: u64,
}

impl CacheTierStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Format stats as summary string
    pub fn summary(&self) -> String {
        format!(
            "entries: {}, hits: {}, misses: {}, hit rate: {:.1}%",
            self.entries,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0
        )
    }
}

/// Combined statistics for both cache tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualCacheStats {
    /// L1 (in-memory) tier statistics
    pub l1: CacheTierStats,
    /// L2 (persistent) tier statistics, if enabled
    pub l2: Option<CacheTierStats>,
}

impl DualCacheStats {
    /// Total hits across both tiers
    pub fn total_hits(&self) -> u64 {
        self.l1.hits + self.l2.as_ref().map(|s| s.hits).unwrap_or(0)
    }

    /// Total misses across both tiers
    pub fn total_misses(&self) -> u64 {
        self.l1.misses + self.l2.as_ref().map(|s| s.misses).unwrap_or(0)
    }

    /// Combined hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_hits() + self.total_misses();
        if total == 0 {
            0.0
        } else {
            self.total_hits() as f64 / total as f64
        }
    }
}
