//! Token-bucket rate limiting for MCP tool invocations
//!
//! Gates every tool call by category-specific budgets (read/write/admin),
//! with one independent bucket per tool name. Sits at the invocation
//! boundary, independent of the query cache pipeline.

mod bucket;
mod limiter;
mod types;

#[cfg(test)]
mod tests;

pub use bucket::TokenBucket;
pub use limiter::McpRateLimiter;
pub use types::{
    CategoryLimit, CategoryStats, RateLimitResponse, RateLimiterConfig, RateLimiterStats,
    ToolCategory,
};
