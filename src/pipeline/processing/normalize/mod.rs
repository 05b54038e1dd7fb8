//! Tabular cleaning: turns a source table of raw strings into a typed,
//! normalized table ready for the store.
//!
//! Steps, in order:
//! 1. trim column names
//! 2. trim every text cell
//! 3. parse every column whose name contains `DATE` (any case) into UTC timestamps,
//!    unparseable cells become null
//! 4. coerce `BARCODE`, if present, to a non-negative integer (0 when invalid)
//! 5. apply the table's rules from [`registry::rules_for`]
//!
//! Cleaning is all-or-nothing: any error fails the whole table.

pub mod dates;
pub mod numeric;
pub mod registry;

use crate::error::{EtlError, Result};
use crate::metrics::CleanMetrics;
use crate::table::{Table, Value};
use crate::types::TableId;
use std::collections::HashSet;
use tracing::debug;

pub use registry::{rules_for, NumericKind, Rule};

pub const BARCODE_COLUMN: &str = "BARCODE";

/// Cleans `source` according to the rules for `table`.
pub fn clean_table(source: Table, table: TableId) -> Result<Table> {
    let rows_in = source.len();
    let result = apply_all(source, table);
    match &result {
        Ok(cleaned) => CleanMetrics::record_success(table, rows_in, cleaned.len()),
        Err(_) => CleanMetrics::record_failure(table),
    }
    result
}

fn apply_all(source: Table, table: TableId) -> Result<Table> {
    let Table { columns, rows } = source;
    let mut t = Table::new(trim_column_names(columns, table)?, rows);

    trim_values(&mut t);

    let nulled = parse_date_columns(&mut t);
    if nulled > 0 {
        debug!("{}: {} unparseable date values set to null", table, nulled);
    }
    CleanMetrics::record_unparsed_dates(table, nulled);

    coerce_barcode(&mut t);

    for rule in rules_for(table) {
        apply_rule(&mut t, table, rule)?;
    }
    Ok(t)
}

fn trim_column_names(columns: Vec<String>, table: TableId) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    columns
        .into_iter()
        .map(|c| {
            let trimmed = c.trim().to_string();
            if !seen.insert(trimmed.clone()) {
                return Err(EtlError::DuplicateColumn {
                    table,
                    column: trimmed,
                });
            }
            Ok(trimmed)
        })
        .collect()
}

fn trim_values(t: &mut Table) {
    for cell in t.rows.iter_mut().flatten() {
        if let Value::Text(s) = cell {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
    }
}

/// Returns how many non-empty cells could not be parsed.
fn parse_date_columns(t: &mut Table) -> usize {
    let date_columns: Vec<usize> = t
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| name.to_uppercase().contains("DATE"))
        .map(|(i, _)| i)
        .collect();

    let mut nulled = 0;
    for row in &mut t.rows {
        for &idx in &date_columns {
            let cell = &mut row[idx];
            *cell = match std::mem::replace(cell, Value::Null) {
                Value::Text(s) => match dates::parse_utc_timestamp(&s) {
                    Some(ts) => Value::Timestamp(ts),
                    None => {
                        if !s.is_empty() {
                            nulled += 1;
                        }
                        Value::Null
                    }
                },
                ts @ Value::Timestamp(_) => ts,
                _ => Value::Null,
            };
        }
    }
    nulled
}

fn coerce_barcode(t: &mut Table) {
    if let Some(idx) = t.column_index(BARCODE_COLUMN) {
        for row in &mut t.rows {
            row[idx] = Value::Integer(numeric::barcode_of(&row[idx]));
        }
    }
}

fn require_column(t: &Table, table: TableId, column: &str) -> Result<usize> {
    t.column_index(column).ok_or_else(|| EtlError::MissingColumn {
        table,
        column: column.to_string(),
    })
}

fn apply_rule(t: &mut Table, table: TableId, rule: &Rule) -> Result<()> {
    match *rule {
        Rule::FillMissing { column, value } => {
            let idx = require_column(t, table, column)?;
            for row in &mut t.rows {
                if row[idx].is_missing() {
                    row[idx] = Value::from(value);
                }
            }
        }
        Rule::Uppercase { column } => {
            let idx = require_column(t, table, column)?;
            for row in &mut t.rows {
                if let Value::Text(s) = &mut row[idx] {
                    *s = s.to_uppercase();
                }
            }
        }
        Rule::CoerceNumeric {
            column,
            rename_to,
            kind,
        } => {
            let Some(idx) = t.column_index(column) else {
                return Ok(());
            };
            if rename_to != column && t.has_column(rename_to) {
                return Err(EtlError::DuplicateColumn {
                    table,
                    column: rename_to.to_string(),
                });
            }

            let numbers: Vec<f64> = t
                .rows
                .iter()
                .map(|row| numeric::number_of(&row[idx]).unwrap_or(0.0))
                .collect();
            let whole = kind == NumericKind::Inferred
                && numbers.iter().all(|n| numeric::as_whole(*n).is_some());

            for (row, n) in t.rows.iter_mut().zip(numbers) {
                row[idx] = match numeric::as_whole(n) {
                    Some(i) if whole => Value::Integer(i),
                    _ => Value::Real(n),
                };
            }
            t.columns[idx] = rename_to.to_string();
        }
        Rule::DropMissing { columns } => {
            let mut idxs = Vec::with_capacity(columns.len());
            for column in columns {
                idxs.push(require_column(t, table, column)?);
            }
            let before = t.rows.len();
            t.rows.retain(|row| idxs.iter().all(|&i| !row[i].is_missing()));
            let dropped = before - t.rows.len();
            if dropped > 0 {
                debug!("{}: dropped {} rows missing {:?}", table, dropped, columns);
            }
        }
    }
    Ok(())
}
