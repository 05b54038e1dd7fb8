//! Load phase metrics

use crate::metrics::phase_metric;
use crate::types::TableId;

pub struct LoadMetrics;

impl LoadMetrics {
    pub fn record_rows_read(table: TableId, rows: usize) {
        ::metrics::histogram!(phase_metric!(histogram, "load", "rows_read"), "table" => table.as_str())
            .record(rows as f64);
    }

    pub fn record_loaded(table: TableId) {
        ::metrics::counter!(phase_metric!(counter, "load", "tables_loaded"), "table" => table.as_str())
            .increment(1);
    }

    /// A table that was missing, empty after cleaning, or failed to load.
    pub fn record_skipped(table: TableId, reason: &'static str) {
        ::metrics::counter!(
            phase_metric!(counter, "load", "tables_skipped"),
            "table" => table.as_str(),
            "reason" => reason
        )
        .increment(1);
    }
}
