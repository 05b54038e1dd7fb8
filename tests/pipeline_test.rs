use anyhow::Result;
use data_cleaning::pipeline::{LoadOutcome, Pipeline, QueryOutcome, SqliteStore};
use data_cleaning::{EtlConfig, TableId};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const USERS_CSV: &str = "\
ID,CREATED_DATE,BIRTH_DATE,STATE,LANGUAGE,GENDER
u1,2019-04-01 10:00:00.000 Z,1980-05-01 00:00:00.000 Z,wa,en,female
u2,2020-02-01 10:00:00.000 Z,1975-01-01 00:00:00.000 Z,,es-419,
u3, 2020-06-15 08:30:00.000 Z ,,ca,,male
";

const TRANSACTIONS_CSV: &str = "\
RECEIPT_ID,PURCHASE_DATE,SCAN_DATE,STORE_NAME,USER_ID,BARCODE,FINAL_QUANTITY,FINAL_SALE
r1,2024-06-01,2024-06-01 12:00:00.000 Z,WALMART,u1,111,2,3.50
r2,2024-06-02,2024-06-02 12:00:00.000 Z,TARGET,u2,222,1.00,
r3,2024-06-03,2024-06-03 12:00:00.000 Z,TARGET,u1,222,zero,1.25
r4,2024-06-04,bad,ALDI,,111,1,9.99
r5,2024-06-05,2024-06-05 12:00:00.000 Z,ALDI,u3,111,1,2.00
";

const PRODUCTS_CSV: &str = "\
CATEGORY_1,CATEGORY_2,MANUFACTURER,BRAND,BARCODE
Snacks,Chips,ACME,CRUNCHY,111
,Candy,SWEETCO,SUGARY,222
Beverages,Soda,FIZZ,BUBBLY,
";

const QUERIES: [(&str, &str); 3] = [
    ("fetch-growth-by-year.sql", include_str!("../sql-queries/fetch-growth-by-year.sql")),
    (
        "top-brands-established-users.sql",
        include_str!("../sql-queries/top-brands-established-users.sql"),
    ),
    ("top-brands-over-21.sql", include_str!("../sql-queries/top-brands-over-21.sql")),
];

/// Lays out the default folder structure under `root`, skipping any table in `skip`.
fn write_fixtures(root: &Path, skip: &[TableId]) -> Result<EtlConfig> {
    let config = EtlConfig::with_root(root);
    for source in &config.sources {
        if skip.contains(&source.table) {
            continue;
        }
        let content = match source.table {
            TableId::Users => USERS_CSV,
            TableId::Transactions => TRANSACTIONS_CSV,
            TableId::Products => PRODUCTS_CSV,
        };
        if let Some(parent) = source.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&source.path, content)?;
    }
    fs::create_dir_all(&config.query_dir)?;
    for (name, sql) in QUERIES {
        fs::write(config.query_file_path(name), sql)?;
    }
    Ok(config)
}

#[test]
fn test_full_run_produces_cleaned_files_and_results() -> Result<()> {
    let dir = tempdir()?;
    let config = write_fixtures(dir.path(), &[])?;

    let summary = Pipeline::run(&config)?;
    assert_eq!(summary.tables_loaded(), 3);
    assert_eq!(summary.results_written(), 3);

    for id in TableId::ALL {
        let cleaned = fs::read_to_string(config.cleaned_file_path(id))?;
        assert!(cleaned.lines().count() > 1, "{} side file has no rows", id);
    }

    let store = SqliteStore::new(&config.database_path);
    assert_eq!(store.table_names()?, vec!["products", "transactions", "users"]);
    Ok(())
}

#[test]
fn test_cleaned_users_file_contents() -> Result<()> {
    let dir = tempdir()?;
    let config = write_fixtures(dir.path(), &[])?;
    Pipeline::run(&config)?;

    let users = fs::read_to_string(config.cleaned_file_path(TableId::Users))?;
    assert_eq!(
        users,
        "ID,CREATED_DATE,BIRTH_DATE,STATE,LANGUAGE,GENDER\n\
         u1,2019-04-01 10:00:00+00:00,1980-05-01 00:00:00+00:00,WA,en,female\n\
         u2,2020-02-01 10:00:00+00:00,1975-01-01 00:00:00+00:00,UNKNOWN,es-419,unknown\n\
         u3,2020-06-15 08:30:00+00:00,,CA,unknown,male\n"
    );
    Ok(())
}

#[test]
fn test_cleaned_transactions_drop_rows_and_rename_columns() -> Result<()> {
    let dir = tempdir()?;
    let config = write_fixtures(dir.path(), &[])?;
    let summary = Pipeline::run(&config)?;

    match summary.table(TableId::Transactions) {
        Some(LoadOutcome::Loaded { rows, dropped, .. }) => {
            assert_eq!(*rows, 4);
            assert_eq!(*dropped, 1);
        }
        other => panic!("transactions not loaded: {:?}", other),
    }

    let store = SqliteStore::new(&config.database_path);
    let result = store.run_query(
        "SELECT RECEIPT_ID, QUANTITY, SALE, SCAN_DATE FROM transactions ORDER BY RECEIPT_ID",
    )?;
    let rendered: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();
    assert_eq!(
        rendered,
        vec![
            vec!["r1", "2", "3.5", "2024-06-01 12:00:00+00:00"],
            vec!["r2", "1", "0.0", "2024-06-02 12:00:00+00:00"],
            vec!["r3", "0", "1.25", "2024-06-03 12:00:00+00:00"],
            vec!["r5", "1", "2.0", "2024-06-05 12:00:00+00:00"],
        ]
    );
    Ok(())
}

#[test]
fn test_query_results_match_expected_rows() -> Result<()> {
    let dir = tempdir()?;
    let config = write_fixtures(dir.path(), &[])?;
    Pipeline::run(&config)?;

    let read = |name: &str| fs::read_to_string(config.query_result_path(name));
    assert_eq!(
        read("fetch-growth-by-year.sql")?,
        "year,new_users,growth_pct\n2019,1,\n2020,2,100.0\n"
    );
    assert_eq!(
        read("top-brands-over-21.sql")?,
        "BRAND,receipts\nSUGARY,2\nCRUNCHY,1\n"
    );
    assert_eq!(
        read("top-brands-established-users.sql")?,
        "BRAND,total_sales\nCRUNCHY,5.5\nSUGARY,1.25\n"
    );
    Ok(())
}

#[test]
fn test_missing_source_leaves_table_absent_and_queries_fail() -> Result<()> {
    let dir = tempdir()?;
    let config = write_fixtures(dir.path(), &[TableId::Users])?;

    let summary = Pipeline::run(&config)?;
    assert_eq!(summary.table(TableId::Users), Some(&LoadOutcome::Missing));
    assert_eq!(summary.tables_loaded(), 2);

    let store = SqliteStore::new(&config.database_path);
    assert_eq!(store.table_names()?, vec!["products", "transactions"]);

    // Every query joins users
    for (name, _) in QUERIES {
        assert!(
            matches!(summary.query(name), Some(QueryOutcome::Failed { .. })),
            "{} should fail without users",
            name
        );
        assert!(!config.query_result_path(name).exists());
    }
    assert!(!config.cleaned_file_path(TableId::Users).exists());
    Ok(())
}

#[test]
fn test_missing_query_definition_is_skipped() -> Result<()> {
    let dir = tempdir()?;
    let mut config = write_fixtures(dir.path(), &[])?;
    config.queries.insert(0, "does-not-exist.sql".to_string());

    let summary = Pipeline::run(&config)?;
    assert_eq!(summary.query("does-not-exist.sql"), Some(&QueryOutcome::Missing));
    assert_eq!(summary.results_written(), 3);
    Ok(())
}

#[test]
fn test_rerun_recreates_store_and_overwrites_outputs() -> Result<()> {
    let dir = tempdir()?;
    let config = write_fixtures(dir.path(), &[])?;
    Pipeline::run(&config)?;
    let first = fs::read_to_string(config.cleaned_file_path(TableId::Products))?;

    // Leftovers from an earlier run must not survive
    let store = SqliteStore::new(&config.database_path);
    store.replace_table("stale", &data_cleaning::Table::from_strings(&["A"], &[&["1"]]))?;
    fs::write(config.cleaned_file_path(TableId::Products), "junk")?;

    Pipeline::run(&config)?;
    assert_eq!(store.table_names()?, vec!["products", "transactions", "users"]);
    assert_eq!(fs::read_to_string(config.cleaned_file_path(TableId::Products))?, first);
    Ok(())
}

#[test]
fn test_store_initialization_failure_is_fatal() -> Result<()> {
    let dir = tempdir()?;
    let mut config = write_fixtures(dir.path(), &[])?;
    // A directory cannot be removed as a file
    config.database_path = dir.path().join("occupied");
    fs::create_dir_all(config.database_path.join("inner"))?;

    assert!(Pipeline::run(&config).is_err());
    assert!(!config.cleaned_file_path(TableId::Users).exists());
    Ok(())
}
