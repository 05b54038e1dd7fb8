//! Per-phase metrics for a run.
//!
//! Each phase owns a small struct of recording functions so metric names stay
//! in one place. The binary installs a Prometheus recorder only when
//! `ETL_METRICS_FILE` is set and writes a text snapshot there once the run ends.
//! Without a recorder these calls are no-ops.

pub mod clean;
pub mod load;
pub mod query;

pub use clean::CleanMetrics;
pub use load::LoadMetrics;
pub use query::QueryMetrics;

use crate::constants;
use crate::error::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Installs the global Prometheus recorder when `ETL_METRICS_FILE` names a
/// snapshot path. Returns the handle and where to write it.
pub fn init_metrics() -> Option<(PrometheusHandle, PathBuf)> {
    let path = std::env::var_os(constants::METRICS_FILE_ENV_VAR)?;
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some((handle, PathBuf::from(path))),
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    }
}

/// Writes the current metric values in Prometheus text format, replacing `path`.
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, handle.render())?;
    Ok(())
}

/// Runs `f` against a private recorder and returns what it rendered.
#[cfg(test)]
pub(crate) fn capture<F: FnOnce()>(f: F) -> String {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    ::metrics::with_local_recorder(&recorder, f);
    handle.render()
}

/// Builds metric names following `etl_{phase}_{name}[_total]`.
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TableId;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_holds_recorded_counters() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, || LoadMetrics::record_loaded(TableId::Users));

        let dir = tempdir().unwrap();
        let path = dir.path().join("out/metrics.prom");
        write_snapshot(&handle, &path).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("etl_load_tables_loaded_total{table=\"users\"} 1"), "{}", text);
    }

    #[test]
    fn test_capture_sees_phase_metrics() {
        let text = capture(|| CleanMetrics::record_failure(TableId::Products));
        assert!(text.contains("etl_clean_tables_failed_total{table=\"products\"} 1"), "{}", text);
    }

    #[test]
    fn test_phase_metric_naming() {
        assert_eq!(phase_metric!(counter, "load", "tables_loaded"), "etl_load_tables_loaded_total");
        assert_eq!(phase_metric!(histogram, "query", "duration_seconds"), "etl_query_duration_seconds");
    }
}
