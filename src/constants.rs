/// Default file and folder names for a run.
/// Relative paths resolve against the working directory unless a config file says otherwise.

// Inputs
pub const RAW_DATA_DIR: &str = "raw-data";
pub const USERS_FILE: &str = "USER_TAKEHOME.csv";
pub const TRANSACTIONS_FILE: &str = "TRANSACTION_TAKEHOME.csv";
pub const PRODUCTS_FILE: &str = "PRODUCTS_TAKEHOME.csv";
pub const QUERY_DIR: &str = "sql-queries";

// Outputs
pub const DATABASE_FILE: &str = "fetch_data.db";
pub const CLEAN_DATA_DIR: &str = "clean_data";
pub const QUERY_RESULTS_DIR: &str = "query_results";

/// Suffix appended to the table name for cleaned side files.
pub const CLEANED_FILE_SUFFIX: &str = "_cleaned.csv";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "etl.toml";
pub const CONFIG_ENV_VAR: &str = "ETL_CONFIG";

/// When set, a Prometheus text snapshot of the run's metrics is written to this path.
pub const METRICS_FILE_ENV_VAR: &str = "ETL_METRICS_FILE";

pub const DEFAULT_LOG_FILTER: &str = "data_cleaning=info,info";

/// Query definitions run by default, in order.
pub const DEFAULT_QUERIES: [&str; 3] = [
    "fetch-growth-by-year.sql",
    "top-brands-established-users.sql",
    "top-brands-over-21.sql",
];

/// Name a query's result file is saved under: everything before the first dot.
pub fn query_result_name(query_file: &str) -> &str {
    query_file.split('.').next().unwrap_or(query_file)
}
