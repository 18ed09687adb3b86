//! Tests for the telemetry collector

use super::*;
use serde_json::json;

fn record(strategy: &str, estimated_ms: f64, total_ms: f64, success: bool) -> ExecutionRecord {
    ExecutionRecord::new("fact_lookup", strategy, estimated_ms, total_ms, success)
}

#[test]
fn test_estimation_error_derivation() {
    let r = record("parallel", 100.0, 130.0, true);
    assert!((r.estimation_error_pct - 30.0).abs() < f64::EPSILON);

    let r = record("parallel", 100.0, 80.0, true);
    assert!((r.estimation_error_pct + 20.0).abs() < f64::EPSILON);

    // No estimate means no error signal
    let r = record("parallel", 0.0, 80.0, true);
    assert_eq!(r.estimation_error_pct, 0.0);
}

#[test]
fn test_strategy_stats_online_mean() {
    let mut stats = StrategyStats::default();
    stats.observe(&record("parallel", 100.0, 100.0, true));
    stats.observe(&record("parallel", 100.0, 200.0, false));

    assert_eq!(stats.count, 2);
    assert_eq!(stats.success_count, 1);
    assert!((stats.avg_latency_ms - 150.0).abs() < 1e-9);
    // |0%| and |100%| average to 50%
    assert!((stats.avg_estimation_error_pct - 50.0).abs() < 1e-9);
    assert!((stats.success_rate() - 0.5).abs() < 1e-9);
}

#[test]
fn test_query_type_preferred_strategy() {
    let mut stats = QueryTypeStats::default();
    stats.observe(&record("parallel", 10.0, 10.0, true).with_cache_hit(true));
    stats.observe(&record("parallel", 10.0, 10.0, true));
    stats.observe(&record("sequential", 10.0, 10.0, true));

    assert_eq!(stats.preferred_strategy(), Some("parallel"));
    assert!((stats.cache_hit_rate() - 1.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_ring_buffer_bound() {
    let collector = ExecutionTelemetryCollector::new(5);
    for i in 0..12 {
        collector
            .record_execution(record("parallel", 10.0, 10.0 + i as f64, true))
            .await;
    }
    assert_eq!(collector.len().await, 5);

    // Aggregates still cover everything ever recorded
    let report = collector.export_metrics().await;
    assert_eq!(report.strategy_effectiveness["parallel"].count, 12);
    assert_eq!(report.total_records, 5);
}

#[tokio::test]
async fn test_decision_accuracy() {
    let collector = ExecutionTelemetryCollector::with_defaults();
    // 10% over, 10% under: mean |error| is 10%
    collector.record_execution(record("parallel", 100.0, 110.0, true)).await;
    collector.record_execution(record("parallel", 100.0, 90.0, true)).await;

    let accuracy = collector.decision_accuracy().await;
    assert!((accuracy.overall - 90.0).abs() < 1e-9);
    assert!((accuracy.per_strategy["parallel"] - 90.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_decision_accuracy_tracks_the_buffer_window() {
    let collector = ExecutionTelemetryCollector::new(2);
    // A wildly wrong estimate that the ring buffer then evicts
    collector.record_execution(record("parallel", 10.0, 100.0, true)).await;
    collector.record_execution(record("parallel", 100.0, 100.0, true)).await;
    collector.record_execution(record("parallel", 100.0, 100.0, true)).await;

    let accuracy = collector.decision_accuracy().await;
    assert!((accuracy.overall - 100.0).abs() < 1e-9);
    // Per-strategy accuracy covers the same window as the overall figure
    assert!((accuracy.per_strategy["parallel"] - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_decision_accuracy_clamps_at_zero() {
    let collector = ExecutionTelemetryCollector::with_defaults();
    collector.record_execution(record("parallel", 10.0, 100.0, true)).await;

    let accuracy = collector.decision_accuracy().await;
    assert_eq!(accuracy.overall, 0.0);
}

#[tokio::test]
async fn test_trend_improving() {
    let collector = ExecutionTelemetryCollector::with_defaults();
    for _ in 0..4 {
        collector.record_execution(record("parallel", 100.0, 100.0, true)).await;
    }
    for _ in 0..4 {
        collector.record_execution(record("parallel", 100.0, 90.0, true)).await;
    }
    assert_eq!(
        collector.performance_trend(8).await,
        PerformanceTrend::Improving
    );
}

#[tokio::test]
async fn test_trend_degrading() {
    let collector = ExecutionTelemetryCollector::with_defaults();
    for _ in 0..4 {
        collector.record_execution(record("parallel", 100.0, 100.0, true)).await;
    }
    for _ in 0..4 {
        collector.record_execution(record("parallel", 100.0, 110.0, true)).await;
    }
    assert_eq!(
        collector.performance_trend(8).await,
        PerformanceTrend::Degrading
    );
}

#[tokio::test]
async fn test_trend_stable_within_band() {
    let collector = ExecutionTelemetryCollector::with_defaults();
    for _ in 0..4 {
        collector.record_execution(record("parallel", 100.0, 100.0, true)).await;
    }
    for _ in 0..4 {
        collector.record_execution(record("parallel", 100.0, 102.0, true)).await;
    }
    assert_eq!(
        collector.performance_trend(8).await,
        PerformanceTrend::Stable
    );
}

#[tokio::test]
async fn test_trend_classifies_from_two_records() {
    let collector = ExecutionTelemetryCollector::with_defaults();
    collector.record_execution(record("parallel", 100.0, 100.0, true)).await;
    collector.record_execution(record("parallel", 100.0, 90.0, true)).await;
    assert_eq!(
        collector.performance_trend(2).await,
        PerformanceTrend::Improving
    );

    let collector = ExecutionTelemetryCollector::with_defaults();
    collector.record_execution(record("parallel", 100.0, 100.0, true)).await;
    collector.record_execution(record("parallel", 100.0, 110.0, true)).await;
    assert_eq!(
        collector.performance_trend(2).await,
        PerformanceTrend::Degrading
    );
}

#[tokio::test]
async fn test_trend_needs_a_record_per_half() {
    let collector = ExecutionTelemetryCollector::with_defaults();
    collector.record_execution(record("parallel", 100.0, 10.0, true)).await;
    assert_eq!(
        collector.performance_trend(10).await,
        PerformanceTrend::Stable
    );
}

#[tokio::test]
async fn test_export_recommends_failing_strategy() {
    let collector = ExecutionTelemetryCollector::with_defaults();
    for _ in 0..6 {
        collector.record_execution(record("distributed", 100.0, 100.0, false)).await;
    }

    let report = collector.export_metrics().await;
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.contains("distributed")));
}

#[tokio::test]
async fn test_export_is_serializable() {
    let collector = ExecutionTelemetryCollector::with_defaults();
    collector
        .record_execution(
            record("parallel", 50.0, 45.0, true)
                .with_confidence(0.9)
                .with_feature("word_count", json!(7)),
        )
        .await;

    let report = collector.export_metrics().await;
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["performance_trend"], "stable");
    assert_eq!(value["total_records"], 1);
    assert!(value["strategy_effectiveness"]["parallel"]["count"].is_number());
}
