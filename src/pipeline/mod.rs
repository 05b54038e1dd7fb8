// Batch pipeline: initialize the store, load every source, run every query

pub mod ingestion;
pub mod loader;
pub mod output;
pub mod processing;
pub mod queries;
pub mod storage;

use crate::config::EtlConfig;
use crate::types::TableId;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, info_span};
use uuid::Uuid;

pub use loader::{LoadOutcome, Loader};
pub use queries::{QueryOutcome, QueryRunner};
pub use storage::SqliteStore;

/// Result of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub tables: Vec<(TableId, LoadOutcome)>,
    pub queries: Vec<(String, QueryOutcome)>,
}

impl RunSummary {
    pub fn tables_loaded(&self) -> usize {
        self.tables.iter().filter(|(_, o)| o.is_loaded()).count()
    }

    pub fn results_written(&self) -> usize {
        self.queries
            .iter()
            .filter(|(_, o)| matches!(o, QueryOutcome::Written { .. }))
            .count()
    }

    pub fn table(&self, id: TableId) -> Option<&LoadOutcome> {
        self.tables.iter().find(|(t, _)| *t == id).map(|(_, o)| o)
    }

    pub fn query(&self, file: &str) -> Option<&QueryOutcome> {
        self.queries.iter().find(|(q, _)| q == file).map(|(_, o)| o)
    }
}

pub struct Pipeline;

impl Pipeline {
    /// Runs the whole sequence. Only a store initialization failure is returned
    /// as an error; every per-table and per-query problem is logged and recorded
    /// in the summary.
    pub fn run(config: &EtlConfig) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        let _enter = span.enter();

        // Step 1: fresh store
        let store = SqliteStore::new(&config.database_path);
        store.initialize().with_context(|| {
            format!("failed to initialize database '{}'", config.database_path.display())
        })?;

        // Step 2: clean and load sources
        let tables = Loader::new(config, &store).load_all();

        // Step 3: run queries and save results
        let queries = QueryRunner::new(config, &store).run_all();

        let summary = RunSummary {
            run_id,
            tables,
            queries,
        };
        info!(
            "Run finished: {}/{} tables loaded, {}/{} query results written",
            summary.tables_loaded(),
            summary.tables.len(),
            summary.results_written(),
            summary.queries.len()
        );
        match serde_json::to_string(&summary) {
            Ok(json) => debug!("Run summary: {}", json),
            Err(e) => debug!("Run summary could not be serialized: {}", e),
        }
        Ok(summary)
    }
}
