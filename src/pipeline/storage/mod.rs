//! SQLite-backed relational store.
//!
//! A connection is opened for each operation and dropped when it finishes, so
//! no connection state outlives a single initialize, load or query.

use crate::error::{EtlError, Result};
use crate::table::{Table, Value};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Batch, Connection, OpenFlags};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Sidecar files SQLite may leave next to the database.
const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes any existing store at this path and creates an empty one.
    pub fn initialize(&self) -> Result<()> {
        if remove_if_exists(&self.path)? {
            info!("Existing database '{}' deleted.", self.path.display());
        }
        for suffix in SIDECAR_SUFFIXES {
            let mut sidecar = self.path.clone().into_os_string();
            sidecar.push(suffix);
            remove_if_exists(Path::new(&sidecar))?;
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&self.path)?;
        conn.close().map_err(|(_, e)| e)?;
        info!("Database '{}' created successfully.", self.path.display());
        Ok(())
    }

    /// Opens the existing store; never creates one.
    fn open(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Writes `table` under `name`, replacing any table of that name.
    /// Returns the number of rows inserted.
    pub fn replace_table(&self, name: &str, table: &Table) -> Result<usize> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        let quoted = quote_ident(name);
        let column_defs: Vec<String> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let ty = declared_type(table.rows.iter().map(|row| &row[i]));
                format!("{} {}", quote_ident(c), ty)
            })
            .collect();
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {quoted};\nCREATE TABLE {quoted} ({});",
            column_defs.join(", ")
        ))?;

        let placeholders = vec!["?"; table.columns.len()].join(", ");
        let insert = format!("INSERT INTO {quoted} VALUES ({placeholders})");
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in &table.rows {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        debug!("Replaced table {} with {} rows", quoted, table.len());
        Ok(table.len())
    }

    /// Executes a single statement and collects every row it returns.
    ///
    /// Text holding a second statement is rejected rather than partly run;
    /// trailing whitespace and comments are accepted.
    pub fn run_query(&self, sql: &str) -> Result<Table> {
        let conn = self.open()?;

        let mut batch = Batch::new(&conn, sql);
        let Some(mut stmt) = batch.next()? else {
            return Err(EtlError::NoStatement);
        };
        if batch.next()?.is_some() {
            return Err(EtlError::MultipleStatements);
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(value_from_sql(row.get_ref(i)?));
            }
            rows.push(values);
        }
        Ok(Table::new(columns, rows))
    }

    /// Names of all user tables, sorted.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Timestamp(_) => ToSqlOutput::Owned(SqlValue::Text(self.to_string())),
        })
    }
}

fn value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Column type from the non-null values in it. Mixed integer/real is `REAL`,
/// any other mix is `TEXT`.
fn declared_type<'a>(values: impl Iterator<Item = &'a Value>) -> &'static str {
    let mut declared: Option<&'static str> = None;
    for value in values {
        let ty = match value {
            Value::Null => continue,
            Value::Text(_) => "TEXT",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Timestamp(_) => "TIMESTAMP",
        };
        declared = Some(match (declared, ty) {
            (None, ty) => ty,
            (Some(prev), ty) if prev == ty => ty,
            (Some("INTEGER"), "REAL") | (Some("REAL"), "INTEGER") => "REAL",
            _ => "TEXT",
        });
    }
    declared.unwrap_or("TEXT")
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> SqliteStore {
        let store = SqliteStore::new(dir.join("store.db"));
        store.initialize().unwrap();
        store
    }

    #[test]
    fn test_initialize_discards_previous_store() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .replace_table("users", &Table::from_strings(&["ID"], &[&["1"]]))
            .unwrap();
        assert_eq!(store.table_names().unwrap(), vec!["users"]);

        store.initialize().unwrap();
        assert!(store.table_names().unwrap().is_empty());
    }

    #[test]
    fn test_initialize_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("nested/deeper/store.db"));
        store.initialize().unwrap();
        assert!(store.path().is_file());
    }

    #[test]
    fn test_operations_fail_without_store() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("absent.db"));
        assert!(store.run_query("SELECT 1").is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_replace_table_replaces_rather_than_appends() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let first = Table::from_strings(&["ID"], &[&["1"], &["2"]]);
        let second = Table::from_strings(&["ID"], &[&["3"]]);

        assert_eq!(store.replace_table("products", &first).unwrap(), 2);
        assert_eq!(store.replace_table("products", &second).unwrap(), 1);

        let result = store.run_query("SELECT ID FROM products").unwrap();
        assert_eq!(result.rows, vec![vec![Value::from("3")]]);
    }

    #[test]
    fn test_typed_values_round_trip_through_queries() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let ts = Utc.with_ymd_and_hms(2022, 3, 4, 5, 6, 7).unwrap();
        let table = Table::new(
            vec!["NAME".into(), "BARCODE".into(), "SALE".into(), "SCAN_DATE".into()],
            vec![vec![
                Value::from("x"),
                Value::Integer(12),
                Value::Real(1.5),
                Value::Timestamp(ts),
            ]],
        );
        store.replace_table("transactions", &table).unwrap();

        let result = store
            .run_query("SELECT NAME, BARCODE, SALE, SCAN_DATE, strftime('%Y', SCAN_DATE) AS YEAR FROM transactions;\n")
            .unwrap();
        assert_eq!(result.columns, vec!["NAME", "BARCODE", "SALE", "SCAN_DATE", "YEAR"]);
        assert_eq!(
            result.rows[0],
            vec![
                Value::from("x"),
                Value::Integer(12),
                Value::Real(1.5),
                Value::from("2022-03-04 05:06:07+00:00"),
                Value::from("2022"),
            ]
        );
    }

    #[test]
    fn test_query_against_missing_table_is_error() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.run_query("SELECT * FROM users").is_err());
    }

    #[test]
    fn test_second_statement_is_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .replace_table("users", &Table::from_strings(&["ID"], &[&["1"]]))
            .unwrap();

        let err = store.run_query("SELECT ID FROM users; SELECT 2;").unwrap_err();
        assert!(matches!(err, EtlError::MultipleStatements));

        let result = store.run_query("SELECT ID FROM users; -- trailing note\n").unwrap();
        assert_eq!(result.rows, vec![vec![Value::from("1")]]);
    }

    #[test]
    fn test_comment_only_query_is_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let err = store.run_query("-- nothing to run\n").unwrap_err();
        assert!(matches!(err, EtlError::NoStatement));
    }

    #[test]
    fn test_zero_row_query_is_ok_and_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .replace_table("users", &Table::from_strings(&["ID"], &[&["1"]]))
            .unwrap();
        let result = store.run_query("SELECT ID FROM users WHERE ID = 'nope'").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.columns, vec!["ID"]);
    }

    #[test]
    fn test_declared_types() {
        let ints = [Value::Integer(1), Value::Null];
        assert_eq!(declared_type(ints.iter()), "INTEGER");
        let mixed = [Value::Integer(1), Value::Real(1.5)];
        assert_eq!(declared_type(mixed.iter()), "REAL");
        let text = [Value::Integer(1), Value::from("a")];
        assert_eq!(declared_type(text.iter()), "TEXT");
        assert_eq!(declared_type([Value::Null].iter()), "TEXT");
    }

    #[test]
    fn test_identifiers_are_quoted() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
