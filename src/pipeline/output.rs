//! CSV side files: cleaned tables and query results.

use crate::error::Result;
use crate::table::Table;
use csv::Writer;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes `table` as CSV to `path`, creating parent folders and overwriting any
/// previous file.
pub fn write_table_csv<P: AsRef<Path>>(path: P, table: &Table) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_table_to(file, table)
}

pub fn write_table_to<W: Write>(writer: W, table: &Table) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
