//! Execution telemetry
//!
//! Records per-query outcomes (strategy chosen, latency, success, estimation
//! error) into a bounded ring buffer and derives rolling per-strategy and
//! per-query-type statistics. Observability only: recording never blocks or
//! fails the primary query path.

mod collector;
mod types;

#[cfg(test)]
mod tests;

pub use collector::ExecutionTelemetryCollector;
pub use types::{
    DecisionAccuracy, ExecutionRecord, PerformanceTrend, QueryTypeStats, StrategyStats,
    TelemetryReport,
};
