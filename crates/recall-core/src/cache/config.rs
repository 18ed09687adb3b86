//! Query cache configuration

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the dual-level query cache
#[derive(Debug, Clone)]
pub struct QueryCacheConfig {
    /// Maximum L1 (in-memory) entries
    pub l1_max_entries: usize,
    /// TTL for L1 entries
    pub l1_ttl: Duration,
    /// Enable the persistent L2 tier
    pub enable_l2: bool,
    /// Directory backing the L2 tier
    pub l2_dir: PathBuf,
    /// TTL for L2 entries (longer than L1 to amortize cold starts)
    pub l2_ttl: Duration,
    /// Maximum serialized payload size to cache (bytes)
    pub max_entry_size: usize,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            l1_max_entries: 500,
            l1_ttl: Duration::from_secs(300),     // 5 minutes
            enable_l2: true,
            l2_dir: PathBuf::from(".recall_cache"),
            l2_ttl: Duration::from_secs(3600),    // 1 hour
            max_entry_size: 1024 * 1024,          // 1MB
        }
    }
}

impl QueryCacheConfig {
    /// Create a memory-only configuration (no persistent tier)
    pub fn memory_only() -> Self {
        Self {
            enable_l2: false,
            ..Default::default()
        }
    }

    /// Set the L1 capacity
    pub fn with_l1_max_entries(mut self, max_entries: usize) -> Self {
        self.l1_max_entries = max_entries;
        self
    }

    /// Set the L1 TTL
    pub fn with_l1_ttl(mut self, ttl: Duration) -> Self {
        self.l1_ttl = ttl;
        self
    }

    /// Set the L2 TTL
    pub fn with_l2_ttl(mut self, ttl: Duration) -> Self {
        self.l2_ttl = ttl;
        self
    }

    /// Set the L2 directory
    pub fn with_l2_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.l2_dir = dir.into();
        self
    }

    /// Set the maximum cacheable payload size
    pub fn with_max_entry_size(mut self, bytes: usize) -> Self {
        self.max_entry_size = bytes;
        self
    }
}
