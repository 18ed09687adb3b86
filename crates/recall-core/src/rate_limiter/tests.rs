//! Tests for the rate limiter

use super::*;
use std::time::Duration;

#[test]
fn test_bucket_never_exceeds_capacity() {
    let mut bucket = TokenBucket::new(5.0, 100.0);
    // Even after time passes, refill caps at capacity
    std::thread::sleep(Duration::from_millis(50));
    assert!(bucket.available() <= bucket.capacity());
    assert!(bucket.available() >= 0.0);
}

#[test]
fn test_bucket_conservation_on_consume() {
    let mut bucket = TokenBucket::new(10.0, 1.0);
    let before = bucket.available();
    assert!(bucket.try_consume(3.0));
    let after = bucket.available();
    // Decreased by exactly 3, modulo the sub-millisecond refill between calls
    assert!((before - after - 3.0).abs() < 0.01);
}

#[test]
fn test_bucket_unchanged_on_denial() {
    let mut bucket = TokenBucket::new(2.0, 0.5);
    assert!(bucket.try_consume(2.0));
    let before = bucket.available();
    assert!(!bucket.try_consume(1.0));
    let after = bucket.available();
    assert!((after - before).abs() < 0.01);
}

#[test]
fn test_bucket_refills_over_time() {
    let mut bucket = TokenBucket::new(2.0, 10.0);
    assert!(bucket.try_consume(2.0));
    assert!(!bucket.try_consume(1.0));

    std::thread::sleep(Duration::from_millis(150));
    assert!(bucket.try_consume(1.0));
}

#[test]
fn test_bucket_wait_time() {
    let mut bucket = TokenBucket::new(1.0, 1.0);
    assert_eq!(bucket.wait_time(1.0), Duration::ZERO);

    assert!(bucket.try_consume(1.0));
    let wait = bucket.wait_time(1.0);
    assert!(wait > Duration::from_millis(500));
    assert!(wait <= Duration::from_secs(1));
}

#[test]
fn test_bucket_wait_time_with_no_refill() {
    let mut bucket = TokenBucket::new(1.0, 0.0);
    assert!(bucket.try_consume(1.0));
    assert_eq!(bucket.wait_time(1.0), Duration::MAX);
}

#[test]
fn test_categorization_patterns() {
    assert_eq!(ToolCategory::from_tool_name("recall"), ToolCategory::Read);
    assert_eq!(ToolCategory::from_tool_name("search_semantic"), ToolCategory::Read);
    assert_eq!(ToolCategory::from_tool_name("remember"), ToolCategory::Write);
    assert_eq!(ToolCategory::from_tool_name("record_episode"), ToolCategory::Write);
    assert_eq!(ToolCategory::from_tool_name("delete_memory"), ToolCategory::Write);
    assert_eq!(ToolCategory::from_tool_name("forget"), ToolCategory::Write);
    assert_eq!(ToolCategory::from_tool_name("optimize_storage"), ToolCategory::Admin);
    assert_eq!(ToolCategory::from_tool_name("reset_layer"), ToolCategory::Admin);
    // Unmatched names default to read
    assert_eq!(ToolCategory::from_tool_name("unknown_tool"), ToolCategory::Read);
}

#[test]
fn test_derived_burst_size() {
    assert_eq!(CategoryLimit::new(60).effective_burst(), 12);
    assert_eq!(CategoryLimit::new(30).effective_burst(), 6);
    // Floors at 2 for tiny budgets
    assert_eq!(CategoryLimit::new(5).effective_burst(), 2);
    assert_eq!(CategoryLimit::new(0).effective_burst(), 2);
    // Explicit override wins
    assert_eq!(CategoryLimit::new(60).with_burst_size(3).effective_burst(), 3);
}

#[tokio::test]
async fn test_explicit_registration_beats_patterns() {
    let limiter = McpRateLimiter::with_defaults();
    // Pattern says write, registration says admin
    limiter.register_tool("record_episode", ToolCategory::Admin).await;
    assert_eq!(limiter.categorize("record_episode").await, ToolCategory::Admin);
    assert_eq!(limiter.categorize("record_other").await, ToolCategory::Write);
}

#[tokio::test]
async fn test_burst_then_denial() {
    let limiter = McpRateLimiter::new(RateLimiterConfig::default().with_read_limit(60));
    let burst = 12; // max(2, 60/5)

    let mut allowed = 0;
    for _ in 0..20 {
        if limiter.allow_request("recall").await {
            allowed += 1;
        }
    }
    assert_eq!(allowed, burst);

    let stats = limiter.get_stats().await;
    assert_eq!(stats.total, 20);
    assert_eq!(stats.allowed, burst as u64);
    assert_eq!(stats.rate_limited, 20 - burst as u64);
}

#[tokio::test]
async fn test_category_isolation() {
    let limiter = McpRateLimiter::with_defaults();

    // Exhaust the write bucket for "remember"
    while limiter.allow_request("remember").await {}

    // "recall" (read) must be unaffected
    assert!(limiter.allow_request("recall").await);

    // So must another write tool: buckets are per tool, not per category
    assert!(limiter.allow_request("record_episode").await);
}

#[tokio::test]
async fn test_retry_after_guidance() {
    let limiter = McpRateLimiter::with_defaults();

    // No bucket yet: nothing to wait for
    assert_eq!(limiter.get_retry_after("recall").await, Duration::ZERO);

    while limiter.allow_request("recall").await {}
    let retry_after = limiter.get_retry_after("recall").await;
    assert!(retry_after > Duration::ZERO);
    // Read refill is 1 token/sec, so the next token is under a second away
    assert!(retry_after <= Duration::from_secs(1));
}

#[tokio::test]
async fn test_rate_limited_response_shape() {
    let limiter = McpRateLimiter::with_defaults();
    while limiter.allow_request("remember").await {}

    let response = limiter.rate_limited_response("remember").await;
    assert_eq!(response.status, "error");
    assert_eq!(response.error, "Rate limit exceeded");
    assert!(response.retry_after > 0.0);
    assert!(response.message.contains("remember"));

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "error");
    assert!(json["retry_after"].is_number());
}

#[tokio::test]
async fn test_stats_by_category() {
    let limiter = McpRateLimiter::with_defaults();
    limiter.allow_request("recall").await;
    limiter.allow_request("remember").await;
    limiter.allow_request("remember").await;

    let stats = limiter.get_stats().await;
    assert_eq!(stats.by_category["read"].allowed, 1);
    assert_eq!(stats.by_category["write"].allowed, 2);
    assert_eq!(stats.denial_rate(), 0.0);
}

#[tokio::test]
async fn test_reset_restores_budgets() {
    let limiter = McpRateLimiter::with_defaults();
    while limiter.allow_request("recall").await {}

    limiter.reset().await;
    assert!(limiter.allow_request("recall").await);
    assert_eq!(limiter.get_stats().await.total, 1);
}
