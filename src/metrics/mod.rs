//! Metrics for the merge and load phases.
//!
//! Each phase records through the `metrics` facade in its own submodule. Nothing
//! is collected unless a recorder is installed with [`init_metrics`]; for a
//! short-lived batch job the rendered snapshot is written to a file at the end
//! of the run instead of being scraped.

pub mod load;
pub mod merge;

pub use load::LoadMetrics;
pub use merge::MergeMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{EtlError, Result};

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Describe every metric of this phase so the exposition carries HELP text
    fn register_metrics();

    /// Phase name used as the metric prefix
    fn phase_name() -> &'static str;
}

/// Builds metric names following `rental_etl_{phase}_{name}[_total]`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("rental_etl_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("rental_etl_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("rental_etl_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

/// Install the Prometheus recorder and describe all phase metrics.
///
/// Returns `None` when a recorder is already installed (e.g. a second call).
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            MergeMetrics::register_metrics();
            LoadMetrics::register_metrics();
            info!(
                phases = ?[MergeMetrics::phase_name(), LoadMetrics::phase_name()],
                "Prometheus recorder installed"
            );
            Some(handle)
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    }
}

/// Render the current snapshot in Prometheus text format and write it to `path`.
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
    }
    fs::write(path, handle.render()).map_err(|e| EtlError::io(path, e))?;
    info!(path = %path.display(), "wrote metrics snapshot");
    Ok(())
}
