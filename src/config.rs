use crate::constants;
use crate::error::{EtlError, Result};
use crate::types::TableId;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a run needs to know about where inputs live and where outputs go.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    /// SQLite file recreated at the start of every run.
    pub database_path: PathBuf,
    /// Folder receiving `<table>_cleaned.csv` side files.
    pub clean_data_dir: PathBuf,
    /// Folder holding the query definition files.
    pub query_dir: PathBuf,
    /// Folder receiving one CSV per query that returned rows.
    pub query_results_dir: PathBuf,
    /// Source files, loaded in this order.
    pub sources: Vec<SourceConfig>,
    /// Query definition file names under `query_dir`, run in this order.
    pub queries: Vec<String>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub table: TableId,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is not set.
    pub filter: String,
    /// When set, a daily-rotated JSON log is written here as well.
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: constants::DEFAULT_LOG_FILTER.to_string(),
            file_dir: None,
        }
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        let raw = Path::new(constants::RAW_DATA_DIR);
        Self {
            database_path: PathBuf::from(constants::DATABASE_FILE),
            clean_data_dir: PathBuf::from(constants::CLEAN_DATA_DIR),
            query_dir: PathBuf::from(constants::QUERY_DIR),
            query_results_dir: PathBuf::from(constants::QUERY_RESULTS_DIR),
            sources: vec![
                SourceConfig {
                    table: TableId::Users,
                    path: raw.join(constants::USERS_FILE),
                },
                SourceConfig {
                    table: TableId::Transactions,
                    path: raw.join(constants::TRANSACTIONS_FILE),
                },
                SourceConfig {
                    table: TableId::Products,
                    path: raw.join(constants::PRODUCTS_FILE),
                },
            ],
            queries: constants::DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EtlConfig {
    /// Default layout with every relative path placed under `root`.
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        let mut config = Self::default();
        config.rebase(root.as_ref());
        config
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EtlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML config; relative paths in it resolve against the file's directory.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Picks the config for this run: explicit path, then `ETL_CONFIG`, then
    /// `etl.toml` in the working directory, then built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }
        if let Ok(path) = std::env::var(constants::CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Self::load_file(path.trim());
            }
        }
        let local = Path::new(constants::DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::load_file(local);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.table) {
                return Err(EtlError::Config(format!(
                    "table '{}' is configured more than once",
                    source.table
                )));
            }
        }
        if let Some(q) = self.queries.iter().find(|q| q.trim().is_empty()) {
            return Err(EtlError::Config(format!("invalid query file name '{}'", q)));
        }
        Ok(())
    }

    pub fn cleaned_file_path(&self, table: TableId) -> PathBuf {
        self.clean_data_dir
            .join(format!("{}{}", table.as_str(), constants::CLEANED_FILE_SUFFIX))
    }

    pub fn query_file_path(&self, query_file: &str) -> PathBuf {
        self.query_dir.join(query_file)
    }

    pub fn query_result_path(&self, query_file: &str) -> PathBuf {
        self.query_results_dir
            .join(format!("{}.csv", constants::query_result_name(query_file)))
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.database_path);
        join(&mut self.clean_data_dir);
        join(&mut self.query_dir);
        join(&mut self.query_results_dir);
        for source in &mut self.sources {
            join(&mut source.path);
        }
        if let Some(dir) = self.logging.file_dir.as_mut() {
            join(dir);
        }
    }
}
