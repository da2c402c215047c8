//! Load Phase Metrics

use crate::metrics::{phase_metric, PhaseMetrics};

/// Metrics collection for the SQLite load phase
pub struct LoadMetrics;

impl LoadMetrics {
    pub fn record_schema_applied() {
        ::metrics::counter!(phase_metric!(counter, "load", "schema_scripts_applied")).increment(1);
    }

    /// Record the row count of the replaced table
    pub fn record_table_rows(rows: usize) {
        ::metrics::gauge!(phase_metric!(gauge, "load", "table_rows")).set(rows as f64);
    }

    pub fn record_duration(duration_secs: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "load", "duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for LoadMetrics {
    fn register_metrics() {
        ::metrics::describe_counter!(
            phase_metric!(counter, "load", "schema_scripts_applied"),
            "Schema scripts executed before loading"
        );
        ::metrics::describe_gauge!(
            phase_metric!(gauge, "load", "table_rows"),
            "Rows in the loaded table after replacement"
        );
        ::metrics::describe_histogram!(
            phase_metric!(histogram, "load", "duration_seconds"),
            "Wall time of a load run"
        );
    }

    fn phase_name() -> &'static str {
        "load"
    }
}
