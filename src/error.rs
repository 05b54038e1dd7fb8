use crate::types::TableId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required column '{column}' in table '{table}'")]
    MissingColumn { table: TableId, column: String },

    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: TableId, column: String },

    #[error("Query text holds more than one statement")]
    MultipleStatements,

    #[error("Query text holds no statement")]
    NoStatement,

    #[error("Row {row} has {found} fields but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, EtlError>;
