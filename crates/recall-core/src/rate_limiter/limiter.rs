//! Per-tool rate limiting at the MCP tool-invocation boundary

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::bucket::TokenBucket;
use super::types::{RateLimitResponse, RateLimiterConfig, RateLimiterStats, ToolCategory};

/// Rate limiter gating every tool invocation
///
/// Each tool name gets an independent token bucket sized from its category's
/// budget, so exhausting one tool never affects another. Denial is a normal
/// boolean outcome, not an error.
#[derive(Debug)]
pub struct McpRateLimiter {
    /// Per-category budgets
    config: RateLimiterConfig,
    /// Explicit tool categorizations (take precedence over name patterns)
    registrations: Arc<RwLock<HashMap<String, ToolCategory>>>,
    /// Lazily created per-tool buckets
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
    /// Running metrics
    stats: Arc<RwLock<RateLimiterStats>>,
}

impl McpRateLimiter {
    /// Create a new limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            registrations: Arc::new(RwLock::new(HashMap::new())),
            buckets: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(RwLock::new(RateLimiterStats::default())),
        }
    }

    /// Create with default category budgets
    pub fn with_defaults() -> Self {
        Self::new(RateLimiterConfig::default())
    }

    /// Explicitly assign a tool to a category
    pub async fn register_tool(&self, tool_name: impl Into<String>, category: ToolCategory) {
        self.registrations
            .write()
            .await
            .insert(tool_name.into(), category);
    }

    /// Resolve a tool's category: explicit registration, then name pattern,
    /// then the READ default
    pub async fn categorize(&self, tool_name: &str) -> ToolCategory {
        if let Some(category) = self.registrations.read().await.get(tool_name) {
            return *category;
        }
        ToolCategory::from_tool_name(tool_name)
    }

    /// Check whether a tool invocation is within budget
    ///
    /// Consumes one token from the tool's bucket on success. Never errors;
    /// a `false` return is the rate-limit signal.
    pub async fn allow_request(&self, tool_name: &str) -> bool {
        let category = self.categorize(tool_name).await;
        let limit = self.config.limit_for(category);

        let allowed = {
            let mut buckets = self.buckets.lock().await;
            let bucket = buckets.entry(tool_name.to_string()).or_insert_with(|| {
                TokenBucket::new(limit.effective_burst() as f64, limit.refill_per_second())
            });
            bucket.try_consume(1.0)
        };

        let mut stats = self.stats.write().await;
        stats.total += 1;
        let category_stats = stats.by_category.entry(category.name().to_string()).or_default();
        if allowed {
            category_stats.allowed += 1;
        } else {
            category_stats.rate_limited += 1;
        }
        if allowed {
            stats.allowed += 1;
        } else {
            stats.rate_limited += 1;
            debug!("rate limited tool '{}' ({})", tool_name, category);
        }

        allowed
    }

    /// Time until the tool's next request can succeed
    ///
    /// Zero if the tool has no bucket yet (it has never been throttled).
    pub async fn get_retry_after(&self, tool_name: &str) -> Duration {
        let mut buckets = self.buckets.lock().await;
        match buckets.get_mut(tool_name) {
            Some(bucket) => bucket.wait_time(1.0),
            None => Duration::ZERO,
        }
    }

    /// Build the structured response for a denied invocation
    pub async fn rate_limited_response(&self, tool_name: &str) -> RateLimitResponse {
        let retry_after = self.get_retry_after(tool_name).await;
        RateLimitResponse::new(tool_name, retry_after)
    }

    /// Get running metrics
    pub async fn get_stats(&self) -> RateLimiterStats {
        self.stats.read().await.clone()
    }

    /// Drop all buckets and metrics (testing/maintenance)
    pub async fn reset(&self) {
        self.buckets.lock().await.clear();
        *self.stats.write().await = RateLimiterStats::default();
    }

    /// The configured budgets
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

impl Default for McpRateLimiter {
    fn default() -> Self {
        Self::with_defaults()
    }
}
