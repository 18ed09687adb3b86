//! Recall Core Library
//!
//! This crate provides the query acceleration core for an agentic memory
//! system: a dual-level (memory + disk) query cache, per-tool token-bucket
//! rate limiting, execution telemetry, confidence-weighted result
//! aggregation, and search depth selection.

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod rate_limiter;
pub mod telemetry;
pub mod tier;

// Re-export commonly used types
pub use aggregator::{AggregatedResult, ResultAggregator, ResultSource};
pub use cache::{CacheEntry, DualCacheStats, DualLevelCache, QueryCacheConfig, QueryKey};
pub use error::{RecallError, RecallResult};
pub use rate_limiter::{McpRateLimiter, RateLimitResponse, RateLimiterConfig, ToolCategory};
pub use telemetry::{ExecutionRecord, ExecutionTelemetryCollector, PerformanceTrend};
pub use tier::{SearchDepth, TierSelector};
