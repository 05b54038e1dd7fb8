use crate::config::EtlConfig;
use crate::error::Result;
use crate::metrics::QueryMetrics;
use crate::pipeline::output::write_table_csv;
use crate::pipeline::storage::SqliteStore;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, info_span, warn};

/// What happened to one configured query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Written { rows: usize, result_file: PathBuf },
    /// Ran fine and returned no rows.
    Empty,
    /// Definition file absent.
    Missing,
    /// Definition file unreadable or blank.
    Skipped { reason: String },
    /// Execution failed.
    Failed { reason: String },
}

/// Reads a query definition. `Ok(None)` when the file does not exist.
pub fn read_query_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(sql) => Ok(Some(sql)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Runs the configured query definitions against the store and saves non-empty results.
pub struct QueryRunner<'a> {
    config: &'a EtlConfig,
    store: &'a SqliteStore,
}

impl<'a> QueryRunner<'a> {
    pub fn new(config: &'a EtlConfig, store: &'a SqliteStore) -> Self {
        Self { config, store }
    }

    pub fn run_all(&self) -> Vec<(String, QueryOutcome)> {
        self.config
            .queries
            .iter()
            .map(|q| (q.clone(), self.run_named(q)))
            .collect()
    }

    pub fn run_named(&self, query_file: &str) -> QueryOutcome {
        let span = info_span!("query", file = %query_file);
        let _enter = span.enter();
        info!("Running query from file: {}", query_file);

        let sql = match read_query_file(&self.config.query_file_path(query_file)) {
            Ok(Some(sql)) if !sql.trim().is_empty() => sql,
            Ok(Some(_)) => {
                warn!("SQL file '{}' is empty.", query_file);
                QueryMetrics::record_skipped("empty");
                return QueryOutcome::Skipped {
                    reason: "empty query definition".to_string(),
                };
            }
            Ok(None) => {
                warn!("SQL file '{}' not found.", query_file);
                QueryMetrics::record_missing();
                return QueryOutcome::Missing;
            }
            Err(e) => {
                warn!("Error reading SQL file '{}': {}", query_file, e);
                QueryMetrics::record_skipped("unreadable");
                return QueryOutcome::Skipped { reason: e.to_string() };
            }
        };

        let started = Instant::now();
        let result = match self.store.run_query(&sql) {
            Ok(result) => result,
            Err(e) => {
                error!("Error running SQL query '{}': {}", query_file, e);
                QueryMetrics::record_failure();
                return QueryOutcome::Failed { reason: e.to_string() };
            }
        };

        let elapsed = started.elapsed().as_secs_f64();

        if result.is_empty() {
            warn!("No results returned for query '{}'.", query_file);
            QueryMetrics::record_empty();
            return QueryOutcome::Empty;
        }

        let result_file = self.config.query_result_path(query_file);
        match write_table_csv(&result_file, &result) {
            Ok(()) => {
                QueryMetrics::record_success(result.len(), elapsed);
                info!("Query results saved to '{}'", result_file.display());
                QueryOutcome::Written {
                    rows: result.len(),
                    result_file,
                }
            }
            Err(e) => {
                error!("Error saving results for query '{}': {}", query_file, e);
                QueryMetrics::record_failure();
                QueryOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}
