//! Reading raw CSV extracts into source tables.

use crate::error::{EtlError, Result};
use crate::table::{Table, Value};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reads a CSV file with every value kept as a string.
///
/// Short rows are padded with empty strings; a row with more fields than the
/// header is an error.
pub fn read_source_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = read_source_table_from(file)?;
    debug!(
        "Read {} rows x {} columns from '{}'",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

pub fn read_source_table_from<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() > width {
            return Err(EtlError::RaggedRow {
                // 1-based, counting the header line
                row: i + 2,
                expected: width,
                found: record.len(),
            });
        }
        let mut row: Vec<Value> = record.iter().map(Value::from).collect();
        row.resize(width, Value::Text(String::new()));
        rows.push(row);
    }

    Ok(Table::new(columns, rows))
}
