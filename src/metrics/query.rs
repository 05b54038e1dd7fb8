//! Query phase metrics

use crate::metrics::phase_metric;

pub struct QueryMetrics;

impl QueryMetrics {
    pub fn record_success(rows: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "query", "succeeded")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "query", "rows_returned")).record(rows as f64);
        ::metrics::histogram!(phase_metric!(histogram, "query", "duration_seconds")).record(duration_secs);
    }

    pub fn record_empty() {
        ::metrics::counter!(phase_metric!(counter, "query", "empty")).increment(1);
    }

    pub fn record_failure() {
        ::metrics::counter!(phase_metric!(counter, "query", "failed")).increment(1);
    }

    pub fn record_missing() {
        ::metrics::counter!(phase_metric!(counter, "query", "missing")).increment(1);
    }

    /// A definition that was blank or could not be read.
    pub fn record_skipped(reason: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "query", "skipped"), "reason" => reason).increment(1);
    }
}
