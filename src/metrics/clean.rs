//! Cleaning phase metrics

use crate::metrics::phase_metric;
use crate::types::TableId;

pub struct CleanMetrics;

impl CleanMetrics {
    pub fn record_success(table: TableId, rows_in: usize, rows_out: usize) {
        ::metrics::counter!(phase_metric!(counter, "clean", "tables_cleaned"), "table" => table.as_str())
            .increment(1);
        ::metrics::counter!(phase_metric!(counter, "clean", "rows_dropped"), "table" => table.as_str())
            .increment(rows_in.saturating_sub(rows_out) as u64);
    }

    pub fn record_failure(table: TableId) {
        ::metrics::counter!(phase_metric!(counter, "clean", "tables_failed"), "table" => table.as_str())
            .increment(1);
    }

    /// Cells in a DATE column that could not be parsed and were nulled.
    pub fn record_unparsed_dates(table: TableId, count: usize) {
        if count > 0 {
            ::metrics::counter!(phase_metric!(counter, "clean", "dates_nulled"), "table" => table.as_str())
                .increment(count as u64);
        }
    }
}
