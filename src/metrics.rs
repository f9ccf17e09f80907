//! Operation metrics and tracing spans.
//!
//! With the `metrics` feature, every load/save/delete is counted by
//! outcome and timed through the global OpenTelemetry meter. Exporter
//! wiring belongs to the application. With the `tracing` feature,
//! [`tracing_helpers`] opens one span per operation and statement.

use std::time::Instant;

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
    KeyValue,
};

/// Record operations observed by metrics and spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Save,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Load => "load",
            Operation::Save => "save",
            Operation::Delete => "delete",
        }
    }
}

/// How an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Vetoed,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Vetoed => "vetoed",
            Outcome::Failed => "failed",
        }
    }
}

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<RecordMetrics> = Lazy::new(RecordMetrics::init);

#[cfg(feature = "metrics")]
pub struct RecordMetrics {
    pub operations_total: Counter<u64>,
    pub operation_duration: Histogram<f64>,
}

#[cfg(feature = "metrics")]
impl RecordMetrics {
    pub fn init() -> Self {
        let meter = global::meter("dbrecord");

        let operations_total = meter
            .u64_counter("dbrecord_operations_total")
            .with_description("Record operations by kind and outcome")
            .build();

        let operation_duration = meter
            .f64_histogram("dbrecord_operation_duration_seconds")
            .with_description("Duration of record operations")
            .build();

        Self {
            operations_total,
            operation_duration,
        }
    }

    pub fn record_operation(&self, operation: Operation, outcome: Outcome, elapsed: std::time::Duration) {
        let op = KeyValue::new("operation", operation.as_str());
        self.operations_total
            .add(1, &[op.clone(), KeyValue::new("outcome", outcome.as_str())]);
        self.operation_duration.record(elapsed.as_secs_f64(), &[op]);
    }
}

/// Record one finished operation. A no-op without the `metrics` feature.
#[allow(unused_variables)]
pub(crate) fn observe(operation: Operation, started: Instant, outcome: Outcome) {
    #[cfg(feature = "metrics")]
    METRICS.record_operation(operation, outcome, started.elapsed());
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    pub fn load_span(table: &str) -> Span {
        tracing::debug_span!("dbrecord.load", table = table)
    }

    pub fn save_span(table: &str, insert: bool) -> Span {
        tracing::debug_span!("dbrecord.save", table = table, insert = insert)
    }

    pub fn delete_span(table: &str) -> Span {
        tracing::debug_span!("dbrecord.delete", table = table)
    }

    /// Span wrapping one statement execution.
    pub fn statement_span(sql: &str) -> Span {
        tracing::trace_span!("dbrecord.statement", sql = sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Operation::Save.as_str(), "save");
        assert_eq!(Outcome::Vetoed.as_str(), "vetoed");
    }

    #[test]
    fn test_observe_does_not_panic_without_exporter() {
        observe(Operation::Load, Instant::now(), Outcome::Success);
        observe(Operation::Delete, Instant::now(), Outcome::Failed);
    }
}
