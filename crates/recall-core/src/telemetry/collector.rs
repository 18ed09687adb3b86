//! Execution telemetry collector

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::types::{
    DecisionAccuracy, ExecutionRecord, PerformanceTrend, QueryTypeStats, StrategyStats,
    TelemetryReport,
};

/// Fewest records needed before a trend is reported (one per half)
const MIN_TREND_RECORDS: usize = 2;

/// Records considered by the exported trend
const TREND_WINDOW: usize = 50;

#[derive(Debug, Default)]
struct TelemetryInner {
    records: VecDeque<ExecutionRecord>,
    strategy_stats: HashMap<String, StrategyStats>,
    query_type_stats: HashMap<String, QueryTypeStats>,
}

/// Collects per-query outcomes and derives rolling statistics
///
/// Recording is best-effort, in-memory only, and never fails the primary
/// query path. The record buffer is a bounded ring: oldest records are
/// evicted first once `max_records` is reached.
#[derive(Debug)]
pub struct ExecutionTelemetryCollector {
    /// Ring buffer capacity
    max_records: usize,
    /// Buffer and aggregates
    inner: Arc<RwLock<TelemetryInner>>,
}

impl ExecutionTelemetryCollector {
    /// Create a collector holding at most `max_records` records
    pub fn new(max_records: usize) -> Self {
        Self {
            max_records: max_records.max(1),
            inner: Arc::new(RwLock::new(TelemetryInner::default())),
        }
    }

    /// Create with the default buffer size
    pub fn with_defaults() -> Self {
        Self::new(1000)
    }

    /// Record one execution outcome
    pub async fn record_execution(&self, record: ExecutionRecord) {
        let mut inner = self.inner.write().await;

        inner
            .strategy_stats
            .entry(record.strategy.clone())
            .or_default()
            .observe(&record);
        inner
            .query_type_stats
            .entry(record.query_type.clone())
            .or_default()
            .observe(&record);

        inner.records.push_back(record);
        while inner.records.len() > self.max_records {
            inner.records.pop_front();
        }
    }

    /// Records currently buffered
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Whether anything has been recorded
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }

    /// How well latency predictions matched reality, overall and per
    /// strategy, over the records currently buffered
    pub async fn decision_accuracy(&self) -> DecisionAccuracy {
        let inner = self.inner.read().await;
        Self::accuracy_of(&inner)
    }

    /// Classify the latency trend over the most recent `last_n` records
    pub async fn performance_trend(&self, last_n: usize) -> PerformanceTrend {
        let inner = self.inner.read().await;
        Self::trend_of(&inner, last_n)
    }

    /// Export a full metrics snapshot
    pub async fn export_metrics(&self) -> TelemetryReport {
        let inner = self.inner.read().await;
        let decision_accuracy = Self::accuracy_of(&inner);
        let performance_trend = Self::trend_of(&inner, TREND_WINDOW);
        let recommendations = Self::recommendations_of(&inner, &decision_accuracy);

        debug!(
            "exporting telemetry: {} records, {} strategies",
            inner.records.len(),
            inner.strategy_stats.len()
        );

        TelemetryReport {
            strategy_effectiveness: inner.strategy_stats.clone(),
            query_type_insights: inner.query_type_stats.clone(),
            decision_accuracy,
            performance_trend,
            recommendations,
            total_records: inner.records.len(),
        }
    }

    /// Drop all records and aggregates (testing/maintenance)
    pub async fn reset(&self) {
        *self.inner.write().await = TelemetryInner::default();
    }

    // Both measures cover the same window (the ring buffer) so they cannot
    // diverge after eviction.
    fn accuracy_of(inner: &TelemetryInner) -> DecisionAccuracy {
        let overall = if inner.records.is_empty() {
            100.0
        } else {
            let mean_abs_error: f64 = inner
                .records
                .iter()
                .map(|r| r.estimation_error_pct.abs())
                .sum::<f64>()
                / inner.records.len() as f64;
            (100.0 - mean_abs_error).max(0.0)
        };

        let mut error_sums: HashMap<String, (f64, usize)> = HashMap::new();
        for record in &inner.records {
            let entry = error_sums.entry(record.strategy.clone()).or_insert((0.0, 0));
            entry.0 += record.estimation_error_pct.abs();
            entry.1 += 1;
        }
        let per_strategy = error_sums
            .into_iter()
            .map(|(strategy, (sum, count))| {
                (strategy, (100.0 - sum / count as f64).max(0.0))
            })
            .collect();

        DecisionAccuracy {
            overall,
            per_strategy,
        }
    }

    fn trend_of(inner: &TelemetryInner, last_n: usize) -> PerformanceTrend {
        let skip = inner.records.len().saturating_sub(last_n);
        let records: Vec<&ExecutionRecord> = inner.records.iter().skip(skip).collect();

        if records.len() < MIN_TREND_RECORDS {
            return PerformanceTrend::Stable;
        }

        let mid = records.len() / 2;
        let avg = |slice: &[&ExecutionRecord]| {
            slice.iter().map(|r| r.total_latency_ms).sum::<f64>() / slice.len() as f64
        };
        let first_half = avg(&records[..mid]);
        let second_half = avg(&records[mid..]);

        if first_half <= 0.0 {
            return PerformanceTrend::Stable;
        }

        let ratio = second_half / first_half;
        if ratio <= 0.95 {
            PerformanceTrend::Improving
        } else if ratio >= 1.05 {
            PerformanceTrend::Degrading
        } else {
            PerformanceTrend::Stable
        }
    }

    fn recommendations_of(inner: &TelemetryInner, accuracy: &DecisionAccuracy) -> Vec<String> {
        let mut recommendations = Vec::new();

        for (strategy, stats) in &inner.strategy_stats {
            if stats.count >= 5 && stats.success_rate() < 0.5 {
                recommendations.push(format!(
                    "Strategy '{}' is failing more than half the time ({:.0}% success); review its selection criteria",
                    strategy,
                    stats.success_rate() * 100.0
                ));
            }
        }

        if accuracy.overall < 70.0 && !inner.records.is_empty() {
            recommendations.push(format!(
                "Latency estimates are off by {:.0}% on average; recalibrate the estimation model",
                100.0 - accuracy.overall
            ));
        }

        for (query_type, stats) in &inner.query_type_stats {
            if stats.count >= 5 && stats.cache_hit_rate() < 0.2 {
                recommendations.push(format!(
                    "Query type '{}' rarely hits cache ({:.0}%); consider longer TTLs or cache warming",
                    query_type,
                    stats.cache_hit_rate() * 100.0
                ));
            }
        }

        recommendations
    }
}

impl Default for ExecutionTelemetryCollector {
    fn default() -> Self {
        Self::with_defaults()
    }
}
