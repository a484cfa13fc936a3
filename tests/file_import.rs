use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

use tsv2sqlite::CancellationToken;
use tsv2sqlite::ImportError;
use tsv2sqlite::ingestion::{ImportOptions, ImportSeverity, import_file, table_name_for};
use tsv2sqlite::types::ColumnType;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn tmp_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("tsv2sqlite-file-{nanos}-{n}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_tsv(name: &str, contents: &str) -> PathBuf {
    let path = tmp_dir().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT count(*) FROM \"{table}\""), [], |r| r.get(0))
        .unwrap()
}

fn table_exists(conn: &Connection, table: &str) -> bool {
    conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |r| r.get::<_, i64>(0),
    )
    .unwrap()
        > 0
}

/// (name, declared type, pk) for each column, from `PRAGMA table_info`.
fn table_info(conn: &Connection, table: &str) -> Vec<(String, String, bool)> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info(\"{table}\")"))
        .unwrap();
    stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, i64>(5)? > 0,
        ))
    })
    .unwrap()
    .map(Result::unwrap)
    .collect()
}

#[test]
fn import_fixture_infers_schema_and_primary_key() {
    let mut conn = Connection::open_in_memory().unwrap();
    let report = import_file(&mut conn, "tests/fixtures/scores.tsv", &ImportOptions::default())
        .unwrap();

    assert_eq!(report.table_name, "scores");
    assert_eq!(report.rows_inserted, 2);
    let types: Vec<ColumnType> = report.columns.iter().map(|c| c.column_type).collect();
    assert_eq!(
        types,
        vec![ColumnType::Integer, ColumnType::Real, ColumnType::Text]
    );

    assert_eq!(
        table_info(&conn, "scores"),
        vec![
            ("id".to_string(), "INTEGER".to_string(), true),
            ("score".to_string(), "REAL".to_string(), false),
            ("label".to_string(), "TEXT".to_string(), false),
        ]
    );

    let (score, score_type): (f64, String) = conn
        .query_row(
            "SELECT score, typeof(score) FROM scores WHERE id = 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(score, 3.5);
    assert_eq!(score_type, "real");

    let label: String = conn
        .query_row("SELECT label FROM scores WHERE id = 2", [], |r| r.get(0))
        .unwrap();
    assert_eq!(label, "B");
}

#[test]
fn header_is_cleaned_and_blank_rows_are_skipped() {
    let mut conn = Connection::open_in_memory().unwrap();
    let report = import_file(&mut conn, "tests/fixtures/cities.tsv", &ImportOptions::default())
        .unwrap();

    let names: Vec<&str> = report.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Town_Name", "population", "area__km2", "city_name", "col", "city_name_2"]
    );
    let types: Vec<ColumnType> = report.columns.iter().map(|c| c.column_type).collect();
    assert_eq!(
        types,
        vec![
            ColumnType::Text,
            ColumnType::Integer,
            ColumnType::Real,
            ColumnType::Text,
            ColumnType::Text,
            ColumnType::Text,
        ]
    );
    assert!(report.columns.iter().all(|c| !c.primary_key));
    assert_eq!(report.rows_inserted, 3);
    assert_eq!(count(&conn, "cities"), 3);

    // Fields are trimmed before insertion and the engine applies column affinity.
    let (population, kind): (i64, String) = conn
        .query_row(
            "SELECT population, typeof(population) FROM cities WHERE Town_Name = 'Bergen'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(population, 291_940);
    assert_eq!(kind, "integer");
}

#[test]
fn short_rows_are_padded_and_long_rows_truncated() {
    let path = write_tsv("ragged.tsv", "a\tb\tc\n1\n4\t5\t6\t7\t8\n");
    let mut conn = Connection::open_in_memory().unwrap();
    let report = import_file(&mut conn, &path, &ImportOptions::default()).unwrap();
    assert_eq!(report.rows_inserted, 2);

    let (b, c): (String, String) = conn
        .query_row("SELECT b, c FROM ragged WHERE a = 1", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(b, "");
    assert_eq!(c, "");

    let c: i64 = conn
        .query_row("SELECT c FROM ragged WHERE a = 4", [], |r| r.get(0))
        .unwrap();
    assert_eq!(c, 6);
}

#[test]
fn file_of_blank_rows_creates_empty_table() {
    let path = write_tsv("blank.tsv", "x\ty\n\n\t\n  \t \n");
    let mut conn = Connection::open_in_memory().unwrap();
    let report = import_file(&mut conn, &path, &ImportOptions::default()).unwrap();

    assert_eq!(report.rows_inserted, 0);
    assert!(
        report
            .columns
            .iter()
            .all(|c| c.column_type == ColumnType::Text)
    );
    assert!(table_exists(&conn, "blank"));
    assert_eq!(count(&conn, "blank"), 0);
}

#[test]
fn failed_insert_rolls_back_the_whole_file() {
    let path = write_tsv("dups.tsv", "id\tname\n1\ta\n2\tb\n2\tc\n3\td\n");
    let mut conn = Connection::open_in_memory().unwrap();

    let err = import_file(&mut conn, &path, &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, ImportError::Insert { line: 4, .. }), "{err:?}");
    assert_eq!(err.severity(), ImportSeverity::Error);
    assert!(err.to_string().contains("dups.tsv"));

    assert!(!table_exists(&conn, "dups"));
}

#[test]
fn failed_insert_keeps_previous_table_contents() {
    let dir = tmp_dir();
    let good = dir.join("people.tsv");
    fs::write(&good, "id\tname\n1\tAda\n").unwrap();

    let mut conn = Connection::open_in_memory().unwrap();
    import_file(&mut conn, &good, &ImportOptions::default()).unwrap();

    // Second import into the same table collides on the primary key.
    fs::write(&good, "id\tname\n2\tGrace\n1\tAda again\n").unwrap();
    let err = import_file(&mut conn, &good, &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, ImportError::Insert { .. }));

    assert_eq!(count(&conn, "people"), 1);
}

#[test]
fn drop_mode_replaces_contents() {
    let path = write_tsv("events.tsv", "id\tkind\n1\topen\n2\tclose\n");
    let mut conn = Connection::open_in_memory().unwrap();
    let opts = ImportOptions {
        drop_existing: true,
        ..Default::default()
    };

    let first = import_file(&mut conn, &path, &opts).unwrap();
    let second = import_file(&mut conn, &path, &opts).unwrap();

    assert_eq!(first, second);
    assert_eq!(count(&conn, "events"), 2);
}

#[test]
fn without_drop_mode_rows_are_appended() {
    let path = write_tsv("log.tsv", "ts\tmsg\n100\tstart\n200\tstop\n");
    let mut conn = Connection::open_in_memory().unwrap();

    import_file(&mut conn, &path, &ImportOptions::default()).unwrap();
    import_file(&mut conn, &path, &ImportOptions::default()).unwrap();

    assert_eq!(count(&conn, "log"), 4);
}

#[test]
fn empty_file_is_rejected() {
    let path = write_tsv("nothing.tsv", "");
    let mut conn = Connection::open_in_memory().unwrap();
    let err = import_file(&mut conn, &path, &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, ImportError::EmptyHeader { .. }));
    assert!(err.to_string().contains("empty header"));
}

#[test]
fn missing_file_is_an_io_error() {
    let mut conn = Connection::open_in_memory().unwrap();
    let err = import_file(
        &mut conn,
        "tests/fixtures/does_not_exist.tsv",
        &ImportOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::Io { .. }));
    assert_eq!(err.severity(), ImportSeverity::Critical);
}

#[test]
fn cancelled_import_leaves_no_table() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let opts = ImportOptions {
        cancel,
        ..Default::default()
    };
    let mut conn = Connection::open_in_memory().unwrap();

    let err = import_file(&mut conn, "tests/fixtures/scores.tsv", &opts).unwrap_err();
    assert!(matches!(err, ImportError::Cancelled { .. }));
    assert!(!table_exists(&conn, "scores"));
}

#[test]
fn cancel_during_inserts_rolls_back_open_transaction() {
    let mut body = String::from("name\tqty\n");
    for i in 0..5 {
        body.push_str(&format!("item{i}\t{i}\n"));
    }
    let path = write_tsv("stock.tsv", &body);

    let cancel = CancellationToken::new();
    let inserted = Arc::new(AtomicUsize::new(0));
    let mut conn = Connection::open_in_memory().unwrap();
    {
        let cancel = cancel.clone();
        let inserted = Arc::clone(&inserted);
        conn.update_hook(Some(move |_action, _db: &str, table: &str, _rowid| {
            if table == "stock" && inserted.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                cancel.cancel();
            }
        }));
    }
    let opts = ImportOptions {
        cancel,
        ..Default::default()
    };

    let err = import_file(&mut conn, &path, &opts).unwrap_err();
    assert!(matches!(err, ImportError::Cancelled { .. }), "{err:?}");
    assert_eq!(err.severity(), ImportSeverity::Critical);
    assert_eq!(inserted.load(Ordering::SeqCst), 2);
    assert!(!table_exists(&conn, "stock"));
}

#[test]
fn cancel_on_last_row_still_rolls_back() {
    let path = write_tsv("pair.tsv", "name\nann\nbob\n");

    let cancel = CancellationToken::new();
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE pair (name TEXT); INSERT INTO pair VALUES ('old');")
        .unwrap();
    {
        let cancel = cancel.clone();
        conn.update_hook(Some(move |_action, _db: &str, table: &str, rowid: i64| {
            if table == "pair" && rowid == 2 {
                cancel.cancel();
            }
        }));
    }
    let opts = ImportOptions {
        drop_existing: true,
        cancel,
        ..Default::default()
    };

    let err = import_file(&mut conn, &path, &opts).unwrap_err();
    assert!(matches!(err, ImportError::Cancelled { .. }), "{err:?}");
    assert_eq!(count(&conn, "pair"), 1);
    let name: String = conn
        .query_row("SELECT name FROM pair", [], |r| r.get(0))
        .unwrap();
    assert_eq!(name, "old");
}

#[test]
fn invalid_utf8_bytes_are_imported_as_replacement_characters() {
    let mut conn = Connection::open_in_memory().unwrap();

    let report = import_file(
        &mut conn,
        "tests/fixtures/latin1.tsv",
        &ImportOptions::default(),
    )
    .unwrap();
    assert_eq!(report.rows_inserted, 2);

    let (name, city): (String, String) = conn
        .query_row("SELECT name, city FROM latin1 WHERE id = 1", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(name, "Jos\u{fffd}");
    assert_eq!(city, "M\u{fffd}laga");
}

#[test]
fn table_names_come_from_the_file_stem() {
    assert_eq!(
        table_name_for(std::path::Path::new("/data/my-data.v2.tsv")).unwrap(),
        "my_data_v2"
    );
    assert_eq!(
        table_name_for(std::path::Path::new("2024 sales.tsv")).unwrap(),
        "c_2024_sales"
    );
    assert_eq!(table_name_for(std::path::Path::new("---.tsv")).unwrap(), "col");
}

#[test]
fn uppercase_id_becomes_primary_key() {
    let path = write_tsv("users.tsv", "name\tID\nann\t7\nbob\t9\n");
    let mut conn = Connection::open_in_memory().unwrap();
    import_file(&mut conn, &path, &ImportOptions::default()).unwrap();

    let info = table_info(&conn, "users");
    assert_eq!(info[1], ("ID".to_string(), "INTEGER".to_string(), true));
    assert!(!info[0].2);
}
