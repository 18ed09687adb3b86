//! Telemetry record and aggregate types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome of one executed query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Unique id for this execution
    pub query_id: Uuid,
    /// When the execution finished
    pub timestamp: DateTime<Utc>,
    /// Classified query type (e.g. "fact_lookup", "relational")
    pub query_type: String,
    /// Execution strategy that was chosen
    pub strategy: String,
    /// Confidence the selector had in that strategy
    pub strategy_confidence: f64,
    /// Whether the query was served from cache
    pub cache_hit: bool,
    /// Latency the selector predicted, in milliseconds
    pub estimated_latency_ms: f64,
    /// Latency actually observed, in milliseconds
    pub total_latency_ms: f64,
    /// Whether the execution succeeded
    pub success: bool,
    /// Signed prediction error as a percentage of the estimate
    pub estimation_error_pct: f64,
    /// Free-form features of the query for later analysis
    pub query_features: HashMap<String, serde_json::Value>,
}

impl ExecutionRecord {
    /// Create a record, deriving the estimation error from the latencies
    pub fn new(
        query_type: impl Into<String>,
        strategy: impl Into<String>,
        estimated_latency_ms: f64,
        total_latency_ms: f64,
        success: bool,
    ) -> Self {
        let estimation_error_pct = if estimated_latency_ms > 0.0 {
            (total_latency_ms - estimated_latency_ms) / estimated_latency_ms * 100.0
        } else {
            0.0
        };

        Self {
            query_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            query_type: query_type.into(),
            strategy: strategy.into(),
            strategy_confidence: 1.0,
            cache_hit: false,
            estimated_latency_ms,
            total_latency_ms,
            success,
            estimation_error_pct,
            query_features: HashMap::new(),
        }
    }

    /// Set the selector's confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.strategy_confidence = confidence;
        self
    }

    /// Mark the query as served from cache
    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }

    /// Attach a query feature
    pub fn with_feature(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.query_features.insert(name.into(), value);
        self
    }

    /// How much faster the query ran than predicted (>1 means faster)
    pub fn speedup(&self) -> f64 {
        if self.total_latency_ms > 0.0 {
            self.estimated_latency_ms / self.total_latency_ms
        } else {
            1.0
        }
    }
}

/// Rolling aggregates for one strategy
///
/// Averages use the standard online-mean update and cover everything ever
/// recorded; the ring buffer only bounds memory, eviction does not subtract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyStats {
    /// Executions observed
    pub count: u64,
    /// Successful executions
    pub success_count: u64,
    /// Running average of observed latency (ms)
    pub avg_latency_ms: f64,
    /// Running average of |estimation error| (percent)
    pub avg_estimation_error_pct: f64,
    /// Running average of estimated/actual latency ratio
    pub avg_speedup: f64,
}

impl StrategyStats {
    /// Fold one record into the aggregates
    pub fn observe(&mut self, record: &ExecutionRecord) {
        let n = self.count as f64;
        self.avg_latency_ms = (self.avg_latency_ms * n + record.total_latency_ms) / (n + 1.0);
        self.avg_estimation_error_pct =
            (self.avg_estimation_error_pct * n + record.estimation_error_pct.abs()) / (n + 1.0);
        self.avg_speedup = (self.avg_speedup * n + record.speedup()) / (n + 1.0);
        self.count += 1;
        if record.success {
            self.success_count += 1;
        }
    }

    /// Fraction of executions that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.count as f64
        }
    }
}

/// Rolling aggregates for one query type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryTypeStats {
    /// Executions observed
    pub count: u64,
    /// Executions served from cache
    pub cache_hits: u64,
    /// How often each strategy was chosen for this type
    pub strategy_counts: HashMap<String, u64>,
}

impl QueryTypeStats {
    /// Fold one record into the aggregates
    pub fn observe(&mut self, record: &ExecutionRecord) {
        self.count += 1;
        if record.cache_hit {
            self.cache_hits += 1;
        }
        *self
            .strategy_counts
            .entry(record.strategy.clone())
            .or_insert(0) += 1;
    }

    /// Fraction of executions served from cache
    pub fn cache_hit_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.count as f64
        }
    }

    /// Most frequently chosen strategy for this query type
    pub fn preferred_strategy(&self) -> Option<&str> {
        self.strategy_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(strategy, _)| strategy.as_str())
    }
}

/// Direction of recent latency movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTrend {
    /// Second half at least 5% faster than the first
    Improving,
    /// Second half at least 5% slower than the first
    Degrading,
    /// Within the 5% band, or too few records to tell
    Stable,
}

impl PerformanceTrend {
    /// Trend label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Degrading => "degrading",
            Self::Stable => "stable",
        }
    }
}

/// How well latency predictions matched reality
///
/// Both fields are computed over the records currently in the ring buffer,
/// unlike [`StrategyStats`] which averages everything ever recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionAccuracy {
    /// `100 - mean(|estimation error|)`, clamped at 0
    pub overall: f64,
    /// Same measure per strategy
    pub per_strategy: HashMap<String, f64>,
}

/// Exported telemetry snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryReport {
    /// Per-strategy aggregates
    pub strategy_effectiveness: HashMap<String, StrategyStats>,
    /// Per-query-type aggregates
    pub query_type_insights: HashMap<String, QueryTypeStats>,
    /// Prediction accuracy
    pub decision_accuracy: DecisionAccuracy,
    /// Recent latency trend
    pub performance_trend: PerformanceTrend,
    /// Actionable observations derived from the aggregates
    pub recommendations: Vec<String>,
    /// Records currently in the ring buffer
    pub total_records: usize,
}
