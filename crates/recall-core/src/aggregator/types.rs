//! Aggregation result types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Map from logical layer/source name to its result payload
pub type LayerMap = HashMap<String, serde_json::Value>;

/// Where a candidate result set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Pre-computed cache hit: fast but possibly stale
    Cache,
    /// Fresh parallel execution: typically most trustworthy
    Parallel,
    /// Distributed fallback: thorough but slower to corroborate
    Distributed,
    /// Sequential fallback path
    Sequential,
}

impl ResultSource {
    /// Fixed confidence prior for this source
    pub fn base_confidence(&self) -> f64 {
        match self {
            Self::Cache => 0.90,
            Self::Parallel => 0.95,
            Self::Distributed => 0.92,
            Self::Sequential => 0.85,
        }
    }

    /// Source name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Parallel => "parallel",
            Self::Distributed => "distributed",
            Self::Sequential => "sequential",
        }
    }
}

/// Merged result map with an overall confidence score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Layer name to merged payload
    pub layers: LayerMap,
    /// Overall confidence in [0, 1]
    pub confidence: f64,
}

impl AggregatedResult {
    /// Number of layers in the merged map
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether the merge produced anything
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
