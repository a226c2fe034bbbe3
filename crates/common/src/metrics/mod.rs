//! Metrics and observability utilities
//!
//! Metric descriptions and recording helpers on the `metrics` facade. The
//! gateway installs the Prometheus recorder; without one these are no-ops.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram,
    gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all Compras metrics
pub const METRICS_PREFIX: &str = "compras";

/// Histogram buckets for question latency (in seconds). Dominated by the
/// answer service round trip.
pub const QUESTION_BUCKETS: &[f64] = &[
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    20.00,  // 20s
    30.00,  // 30s
    60.00,  // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_questions_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of questions handled"
    );

    describe_histogram!(
        format!("{}_question_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end question latency in seconds"
    );

    describe_gauge!(
        format!("{}_rows_loaded", METRICS_PREFIX),
        Unit::Count,
        "Rows read from the spreadsheet on the last load"
    );

    describe_histogram!(
        format!("{}_context_items", METRICS_PREFIX),
        Unit::Count,
        "Items placed in the model context per question"
    );

    describe_counter!(
        format!("{}_answer_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Failed questions by error kind"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record question metrics
pub struct QuestionMetrics {
    start: Instant,
    mode: &'static str,
}

impl QuestionMetrics {
    /// Start tracking a question
    pub fn start(mode: &'static str) -> Self {
        Self {
            start: Instant::now(),
            mode,
        }
    }

    /// Record completion. `outcome` is "success" or an error kind.
    pub fn finish(self, outcome: &'static str) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_questions_total", METRICS_PREFIX),
            "mode" => self.mode,
            "outcome" => outcome
        )
        .increment(1);

        histogram!(
            format!("{}_question_duration_seconds", METRICS_PREFIX),
            "mode" => self.mode
        )
        .record(duration);

        if outcome != "success" {
            counter!(
                format!("{}_answer_errors_total", METRICS_PREFIX),
                "kind" => outcome
            )
            .increment(1);
        }
    }
}

/// Helper to record spreadsheet load size
pub fn record_rows_loaded(rows: usize) {
    gauge!(format!("{}_rows_loaded", METRICS_PREFIX)).set(rows as f64);
}

/// Helper to record how much context a question produced
pub fn record_context_items(query_type: &'static str, items: usize) {
    histogram!(
        format!("{}_context_items", METRICS_PREFIX),
        "query_type" => query_type
    )
    .record(items as f64);
}
