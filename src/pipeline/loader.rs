use crate::config::{EtlConfig, SourceConfig};
use crate::metrics::LoadMetrics;
use crate::pipeline::ingestion::read_source_table;
use crate::pipeline::output::write_table_csv;
use crate::pipeline::processing::normalize::clean_table;
use crate::pipeline::storage::SqliteStore;
use crate::types::TableId;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, info_span, warn};

/// What happened to one configured source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded {
        rows: usize,
        dropped: usize,
        cleaned_file: PathBuf,
    },
    /// Source file absent.
    Missing,
    /// Cleaning succeeded but left no rows.
    Empty,
    Failed { reason: String },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

/// Reads, cleans, saves and stores each configured source independently.
pub struct Loader<'a> {
    config: &'a EtlConfig,
    store: &'a SqliteStore,
}

impl<'a> Loader<'a> {
    pub fn new(config: &'a EtlConfig, store: &'a SqliteStore) -> Self {
        Self { config, store }
    }

    /// Loads every source in configured order. A failure in one never stops the rest.
    pub fn load_all(&self) -> Vec<(TableId, LoadOutcome)> {
        self.config
            .sources
            .iter()
            .map(|source| (source.table, self.load_source(source)))
            .collect()
    }

    pub fn load_source(&self, source: &SourceConfig) -> LoadOutcome {
        let span = info_span!("load", table = %source.table);
        let _enter = span.enter();

        let table = source.table;
        let path = &source.path;

        if !path.exists() {
            warn!("File '{}' not found. Skipping...", path.display());
            LoadMetrics::record_skipped(table, "missing");
            return LoadOutcome::Missing;
        }

        let raw = match read_source_table(path) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error loading CSV '{}' into table '{}': {}", path.display(), table, e);
                LoadMetrics::record_skipped(table, "read_error");
                return LoadOutcome::Failed { reason: e.to_string() };
            }
        };
        let rows_read = raw.len();
        LoadMetrics::record_rows_read(table, rows_read);

        let cleaned = match clean_table(raw, table) {
            Ok(cleaned) => cleaned,
            Err(e) => {
                error!("Error cleaning data for table {}: {}", table, e);
                LoadMetrics::record_skipped(table, "clean_error");
                return LoadOutcome::Failed { reason: e.to_string() };
            }
        };

        if cleaned.is_empty() {
            warn!("Skipping empty cleaned data for table '{}'.", table);
            LoadMetrics::record_skipped(table, "empty");
            return LoadOutcome::Empty;
        }

        let cleaned_file = self.config.cleaned_file_path(table);
        if let Err(e) = write_table_csv(&cleaned_file, &cleaned) {
            error!("Error saving cleaned data for table '{}': {}", table, e);
            LoadMetrics::record_skipped(table, "write_error");
            return LoadOutcome::Failed { reason: e.to_string() };
        }
        info!("Cleaned data saved to '{}'", cleaned_file.display());

        match self.store.replace_table(table.as_str(), &cleaned) {
            Ok(rows) => {
                info!("Loaded '{}' into '{}' table.", path.display(), table);
                LoadMetrics::record_loaded(table);
                LoadOutcome::Loaded {
                    rows,
                    dropped: rows_read - cleaned.len(),
                    cleaned_file,
                }
            }
            Err(e) => {
                error!("Error loading CSV '{}' into table '{}': {}", path.display(), table, e);
                LoadMetrics::record_skipped(table, "store_error");
                LoadOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}
