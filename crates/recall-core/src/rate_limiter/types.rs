//! Rate limiter configuration, categorization, and response types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Name fragments that mark a tool as mutating memory state
const WRITE_PATTERNS: &[&str] = &[
    "record_",
    "create_",
    "update_",
    "delete_",
    "store_",
    "remember",
    "forget",
    "consolidate",
];

/// Name fragments that mark a tool as administrative
const ADMIN_PATTERNS: &[&str] = &["optimize", "reset_", "cleanup_", "migrate", "reindex"];

/// Budget category for a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Read-only queries (recall, search, stats)
    Read,
    /// Mutations of memory state
    Write,
    /// Maintenance operations
    Admin,
}

impl ToolCategory {
    /// Categorize a tool by name-pattern heuristic
    ///
    /// Admin patterns take precedence over write patterns; anything unmatched
    /// defaults to `Read`. Explicit registrations on the limiter override
    /// this heuristic entirely.
    pub fn from_tool_name(tool_name: &str) -> Self {
        let name = tool_name.to_lowercase();
        if ADMIN_PATTERNS.iter().any(|p| name.contains(p)) {
            Self::Admin
        } else if WRITE_PATTERNS.iter().any(|p| name.contains(p)) {
            Self::Write
        } else {
            Self::Read
        }
    }

    /// Category name as used in stats breakdowns
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Rate budget for one tool category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryLimit {
    /// Sustained request budget per minute
    pub max_per_minute: u32,
    /// Burst size (token bucket capacity); derived from the sustained
    /// budget when not set explicitly
    pub burst_size: Option<u32>,
}

impl CategoryLimit {
    /// Create a limit with the derived default burst
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_minute,
            burst_size: None,
        }
    }

    /// Override the burst size
    pub fn with_burst_size(mut self, burst_size: u32) -> Self {
        self.burst_size = Some(burst_size);
        self
    }

    /// Effective burst: explicit override or `max(2, max_per_minute / 5)`
    pub fn effective_burst(&self) -> u32 {
        self.burst_size.unwrap_or_else(|| (self.max_per_minute / 5).max(2))
    }

    /// Sustained refill rate in tokens per second
    pub fn refill_per_second(&self) -> f64 {
        self.max_per_minute as f64 / 60.0
    }
}

/// Per-category limits for the MCP rate limiter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Budget for read tools
    pub read: CategoryLimit,
    /// Budget for write tools
    pub write: CategoryLimit,
    /// Budget for admin tools
    pub admin: CategoryLimit,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            read: CategoryLimit::new(60),
            write: CategoryLimit::new(30),
            admin: CategoryLimit::new(10),
        }
    }
}

impl RateLimiterConfig {
    /// Set the read budget (requests per minute)
    pub fn with_read_limit(mut self, max_per_minute: u32) -> Self {
        self.read = CategoryLimit::new(max_per_minute);
        self
    }

    /// Set the write budget (requests per minute)
    pub fn with_write_limit(mut self, max_per_minute: u32) -> Self {
        self.write = CategoryLimit::new(max_per_minute);
        self
    }

    /// Set the admin budget (requests per minute)
    pub fn with_admin_limit(mut self, max_per_minute: u32) -> Self {
        self.admin = CategoryLimit::new(max_per_minute);
        self
    }

    /// The limit configured for a category
    pub fn limit_for(&self, category: ToolCategory) -> &CategoryLimit {
        match category {
            ToolCategory::Read => &self.read,
            ToolCategory::Write => &self.write,
            ToolCategory::Admin => &self.admin,
        }
    }
}

/// Allowed/denied counters for one category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Requests that passed the bucket
    pub allowed: u64,
    /// Requests denied by the bucket
    pub rate_limited: u64,
}

/// Running metrics for the rate limiter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimiterStats {
    /// Total requests checked
    pub total: u64,
    /// Requests allowed
    pub allowed: u64,
    /// Requests denied
    pub rate_limited: u64,
    /// Breakdown by category name
    pub by_category: HashMap<String, CategoryStats>,
}

impl RateLimiterStats {
    /// Fraction of requests that were denied
    pub fn denial_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.rate_limited as f64 / self.total as f64
        }
    }
}

/// Structured response returned to a rate-limited caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResponse {
    /// Always "error"
    pub status: String,
    /// Always "Rate limit exceeded"
    pub error: String,
    /// Seconds until the next request can succeed
    pub retry_after: f64,
    /// Human-readable guidance
    pub message: String,
}

impl RateLimitResponse {
    /// Build the response for a denied tool call
    pub fn new(tool_name: &str, retry_after: Duration) -> Self {
        let secs = retry_after.as_secs_f64();
        Self {
            status: "error".to_string(),
            error: "Rate limit exceeded".to_string(),
            retry_after: secs,
            message: format!(
                "Too many requests for tool '{}', retry after {:.1}s",
                tool_name, secs
            ),
        }
    }
}
