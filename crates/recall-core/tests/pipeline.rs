//! End-to-end scenarios across the query acceleration components

use std::collections::HashMap;
use std::time::Duration;

use serde_json::json;

use recall_core::{
    DualLevelCache, ExecutionRecord, ExecutionTelemetryCollector, McpRateLimiter,
    QueryCacheConfig, RateLimiterConfig, ResultAggregator, SearchDepth, TierSelector,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn rate_limiter_allows_burst_then_recovers() {
    init_tracing();
    let limiter = McpRateLimiter::new(RateLimiterConfig::default().with_read_limit(60));

    let mut allowed = 0;
    for _ in 0..20 {
        if limiter.allow_request("recall").await {
            allowed += 1;
        }
    }
    assert!(allowed >= 10, "burst should admit at least 10, got {allowed}");
    assert!(allowed < 20, "some of the 20 rapid calls must be denied");

    // One read token refills per second
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(limiter.allow_request("recall").await);
}

#[tokio::test]
async fn dual_cache_miss_then_hit() {
    init_tracing();
    let cache = DualLevelCache::new(QueryCacheConfig::memory_only()).unwrap();
    let params = json!({});

    assert!(cache.get("Q", &params).await.is_none());
    cache.set("Q", &params, json!([1, 2, 3])).await;
    assert_eq!(cache.get("Q", &params).await, Some(json!([1, 2, 3])));
}

#[tokio::test]
async fn dual_cache_persists_across_instances() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = QueryCacheConfig::default().with_l2_dir(dir.path());
    let params = json!({"layer": "semantic"});

    {
        let cache = DualLevelCache::new(config.clone()).unwrap();
        cache.set("Q", &params, json!([1, 2, 3])).await;
    }

    let cache = DualLevelCache::new(config).unwrap();
    cache.initialize().await;
    assert_eq!(cache.get("Q", &params).await, Some(json!([1, 2, 3])));
}

#[tokio::test]
async fn aggregation_merges_cache_and_parallel() {
    init_tracing();
    let aggregator = ResultAggregator::new();
    let cache = HashMap::from([("semantic".to_string(), json!([1, 2]))]);
    let parallel = HashMap::from([
        ("semantic".to_string(), json!([1, 2, 3, 4, 5])),
        ("episodic".to_string(), json!([9])),
    ]);
    let scores = HashMap::from([
        ("semantic".to_string(), 0.95),
        ("episodic".to_string(), 0.9),
    ]);

    let result = aggregator.aggregate_results(Some(&cache), Some(&parallel), None, Some(&scores));

    // 5 items is more than 20% larger than 2, so the fresh set wins
    assert_eq!(result.layers["semantic"], json!([1, 2, 3, 4, 5]));
    assert_eq!(result.layers["episodic"], json!([9]));
    assert!((result.confidence - 0.925).abs() < 1e-9);
}

#[tokio::test]
async fn query_pipeline_flows_through_all_components() {
    init_tracing();
    let selector = TierSelector::new();
    let limiter = McpRateLimiter::with_defaults();
    let cache = DualLevelCache::new(QueryCacheConfig::memory_only()).unwrap();
    let telemetry = ExecutionTelemetryCollector::with_defaults();

    let query = "Why did the migration fail last week?";
    let params = json!({"depth": 2});

    let depth = selector.select_depth(query, None, None);
    assert_eq!(depth, SearchDepth::Balanced);

    assert!(limiter.allow_request("recall").await);

    // Cold cache: the caller fetches fresh and writes back
    assert!(cache.get(query, &params).await.is_none());
    let fresh = json!({"semantic": ["migration rolled back"], "episodic": []});
    cache.set(query, &params, fresh.clone()).await;
    telemetry
        .record_execution(ExecutionRecord::new("relational", "parallel", 120.0, 95.0, true))
        .await;

    // Warm path
    assert!(limiter.allow_request("recall").await);
    assert_eq!(cache.get(query, &params).await, Some(fresh));
    telemetry
        .record_execution(
            ExecutionRecord::new("relational", "parallel", 120.0, 2.0, true).with_cache_hit(true),
        )
        .await;

    let stats = cache.get_stats().await;
    assert_eq!(stats.l1.hits, 1);
    assert_eq!(stats.l1.misses, 1);

    let report = telemetry.export_metrics().await;
    assert_eq!(report.total_records, 2);
    assert_eq!(report.strategy_effectiveness["parallel"].count, 2);
    assert_eq!(report.query_type_insights["relational"].cache_hits, 1);

    let limiter_stats = limiter.get_stats().await;
    assert_eq!(limiter_stats.allowed, 2);
    assert_eq!(limiter_stats.rate_limited, 0);
}
