//! Cache key and entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Cache key derived from a logical query
///
/// The key is a SHA-256 digest over the query text, the canonicalized
/// parameter JSON, and (when present) the canonicalized context JSON, so that
/// identical logical queries hash identically regardless of object identity
/// or JSON key ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    hash: String,
}

impl QueryKey {
    /// Create a new key from query text and parameters
    pub fn new(query: &str, params: &serde_json::Value, context: Option<&serde_json::Value>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(query.as_bytes());
        hasher.update([0x1f]);
        hasher.update(Self::canonical_string(params).as_bytes());
        if let Some(ctx) = context {
            hasher.update([0x1f]);
            hasher.update(Self::canonical_string(ctx).as_bytes());
        }
        Self {
            hash: format!("{:x}", hasher.finalize()),
        }
    }

    /// The hex digest backing this key
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume the key, returning the digest string
    pub fn into_inner(self) -> String {
        self.hash
    }

    fn canonical_string(value: &serde_json::Value) -> String {
        serde_json::to_string(&Self::canonicalize_json(value)).unwrap_or_default()
    }

    /// Canonicalize JSON for consistent hashing
    fn canonicalize_json(value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::Object(map) => {
                // Sort keys for consistent ordering
                let mut sorted: Vec<_> = map.iter().collect();
                sorted.sort_by_key(|(k, _)| *k);

                let canonical: serde_json::Map<String, serde_json::Value> = sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), Self::canonicalize_json(v)))
                    .collect();

                serde_json::Value::Object(canonical)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(Self::canonicalize_json).collect())
            }
            other => other.clone(),
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// A cached query result with lifecycle metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached result payload
    pub value: serde_json::Value,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When the entry expires
    pub expires_at: DateTime<Utc>,
    /// Number of times this entry was served
    pub hit_count: u64,
}

impl CacheEntry {
    /// Create a new entry expiring `ttl` from now
    pub fn new(value: serde_json::Value, ttl: Duration) -> Self {
        let now = Utc::now();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            value,
            created_at: now,
            expires_at: now + chrono::Duration::milliseconds(ttl_ms),
            hit_count: 0,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Age of the entry
    pub fn age(&self) -> Duration {
        (Utc::now() - self.created_at).to_std().unwrap_or_default()
    }

    /// Record a successful read of this entry
    pub fn mark_hit(&mut self) {
        self.hit_count += 1;
    }
}
