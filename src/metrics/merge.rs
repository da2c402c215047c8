//! Merge Phase Metrics
//!
//! Row accounting for the source datasets and timing of a merge run.

use crate::metrics::{phase_metric, PhaseMetrics};

/// Metrics collection for the merge phase
pub struct MergeMetrics;

impl MergeMetrics {
    /// Record the rows read from one source file
    pub fn record_rows_read(dataset: &str, rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "merge", "rows_read"), "dataset" => dataset.to_string())
            .increment(rows as u64);
    }

    /// Record rows dropped because their join key could not be coerced to a year
    pub fn record_null_keys_dropped(dataset: &str, rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "merge", "null_keys_dropped"), "dataset" => dataset.to_string())
            .increment(rows as u64);
    }

    /// Record rows ignored because an earlier row already had the same year
    pub fn record_duplicate_keys(dataset: &str, rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "merge", "duplicate_keys"), "dataset" => dataset.to_string())
            .increment(rows as u64);
    }

    /// Record the size of the written merged table
    pub fn record_output(rows: usize, columns: usize) {
        ::metrics::gauge!(phase_metric!(gauge, "merge", "output_rows")).set(rows as f64);
        ::metrics::gauge!(phase_metric!(gauge, "merge", "output_columns")).set(columns as f64);
    }

    pub fn record_duration(duration_secs: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "merge", "duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for MergeMetrics {
    fn register_metrics() {
        ::metrics::describe_counter!(
            phase_metric!(counter, "merge", "rows_read"),
            "Rows read from each source dataset"
        );
        ::metrics::describe_counter!(
            phase_metric!(counter, "merge", "null_keys_dropped"),
            "Rows dropped because the year could not be parsed"
        );
        ::metrics::describe_counter!(
            phase_metric!(counter, "merge", "duplicate_keys"),
            "Rows ignored because their year was already present"
        );
        ::metrics::describe_gauge!(
            phase_metric!(gauge, "merge", "output_rows"),
            "Rows in the merged output"
        );
        ::metrics::describe_gauge!(
            phase_metric!(gauge, "merge", "output_columns"),
            "Columns in the merged output"
        );
        ::metrics::describe_histogram!(
            phase_metric!(histogram, "merge", "duration_seconds"),
            "Wall time of a merge run"
        );
    }

    fn phase_name() -> &'static str {
        "merge"
    }
}
