//! Per-file import: schema inference followed by a transactional bulk insert.
//!
//! Each file is read twice. The first pass infers column types; the second streams rows through a
//! prepared `INSERT` inside the same transaction that created the table, so a file is either fully
//! committed or not visible at all.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::ByteRecord;
use rusqlite::{Connection, Statement, Transaction, params_from_iter};
use tracing::{debug, info, info_span, trace, warn};

use crate::cancel::CancellationToken;
use crate::error::{ImportError, ImportResult};
use crate::ident::{dedupe, sanitize};
use crate::types::{ColumnSpec, ColumnType, ImportReport, RunSummary};

use super::infer::infer_column_types;
use super::observability::{ImportEvent, ImportObserver, ImportSeverity};
use super::statement::{build_drop_table, build_insert, column_specs, create_table_sql};
use super::tsv::{TsvReader, field, is_blank_record};

const PROGRESS_EVERY: u64 = 10_000;

/// Options controlling how each file is imported.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ImportOptions {
    /// Drop an existing table of the same name before creating it.
    pub drop_existing: bool,
    /// Receives the [`ImportEvent`]s of every file.
    pub observer: Option<Arc<dyn ImportObserver>>,
    /// Failures at or above this severity are flagged as alerts.
    pub alert_at_or_above: ImportSeverity,
    /// Checked before every blocking database call.
    pub cancel: CancellationToken,
}

impl fmt::Debug for ImportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportOptions")
            .field("drop_existing", &self.drop_existing)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            drop_existing: false,
            observer: None,
            alert_at_or_above: ImportSeverity::Critical,
            cancel: CancellationToken::default(),
        }
    }
}

/// Table name for an input file: its file name without extension, sanitized.
pub fn table_name_for(path: &Path) -> ImportResult<String> {
    let stem = path
        .file_stem()
        .ok_or_else(|| ImportError::InvalidName {
            path: path.to_path_buf(),
        })?;
    let name = sanitize(&stem.to_string_lossy());
    if name.is_empty() {
        return Err(ImportError::InvalidName {
            path: path.to_path_buf(),
        });
    }
    Ok(name)
}

/// List the `*.tsv` files directly inside `dir`, sorted by path.
pub fn discover_inputs(dir: &Path) -> ImportResult<Vec<PathBuf>> {
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.tsv");
    let mut files = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry.map_err(|e| ImportError::Io {
            path: e.path().to_path_buf(),
            operation: "list",
            source: e.into(),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(ImportError::NoInputFiles {
            dir: dir.to_path_buf(),
        });
    }
    files.sort();
    Ok(files)
}

/// Import every `*.tsv` file in `dir`, in path order, stopping at the first failure.
pub fn import_dir(
    conn: &mut Connection,
    dir: impl AsRef<Path>,
    options: &ImportOptions,
) -> ImportResult<RunSummary> {
    let files = discover_inputs(dir.as_ref())?;
    import_files(conn, &files, options)
}

/// Import the given files sequentially, stopping at the first failure.
///
/// Tables committed before the failing file are kept.
pub fn import_files<P: AsRef<Path>>(
    conn: &mut Connection,
    files: &[P],
    options: &ImportOptions,
) -> ImportResult<RunSummary> {
    let mut summary = RunSummary::default();
    for path in files {
        let report = import_file(conn, path, options)?;
        summary.tables.push(report);
    }
    info!(
        files = summary.tables.len(),
        rows = summary.total_rows(),
        "import finished"
    );
    Ok(summary)
}

/// Import a single TSV file into a table named after it.
///
/// The configured observer sees [`ImportEvent::SchemaInferred`] before the transaction begins,
/// then [`ImportEvent::Committed`] or [`ImportEvent::Failed`].
pub fn import_file(
    conn: &mut Connection,
    path: impl AsRef<Path>,
    options: &ImportOptions,
) -> ImportResult<ImportReport> {
    let path = path.as_ref();
    let span = info_span!("import_file", path = %path.display());
    let _enter = span.enter();

    let result = import_file_inner(conn, path, options);

    if let Some(observer) = options.observer.as_deref() {
        match &result {
            Ok(report) => observer.on_event(&ImportEvent::Committed(report)),
            Err(error) => {
                let severity = error.severity();
                observer.on_event(&ImportEvent::Failed {
                    path,
                    error,
                    severity,
                    alert: severity >= options.alert_at_or_above,
                });
            }
        }
    }

    result
}

fn import_file_inner(
    conn: &mut Connection,
    path: &Path,
    options: &ImportOptions,
) -> ImportResult<ImportReport> {
    ensure_not_cancelled(&options.cancel, path)?;

    let table = table_name_for(path)?;
    let header = read_header(path)?;
    if header.is_empty() {
        return Err(ImportError::EmptyHeader {
            path: path.to_path_buf(),
        });
    }
    let sanitized: Vec<String> = header.iter().map(|h| sanitize(h)).collect();
    let names = dedupe(&sanitized);

    let types = infer_types(path, names.len())?;
    let columns = column_specs(&names, &types)?;
    info!(%table, columns = columns.len(), "importing");
    debug!(schema = %create_table_sql(&table, &columns), "inferred schema");
    if let Some(observer) = options.observer.as_deref() {
        observer.on_event(&ImportEvent::SchemaInferred {
            path,
            table: &table,
            columns: &columns,
        });
    }

    ensure_not_cancelled(&options.cancel, path)?;
    let tx = conn.transaction().map_err(|source| ImportError::Transaction {
        path: path.to_path_buf(),
        operation: "begin",
        source,
    })?;

    let loaded = load_table(&tx, path, &table, &columns, options)
        .and_then(|rows| ensure_not_cancelled(&options.cancel, path).map(|()| rows));
    let rows_inserted = match loaded {
        Ok(rows) => rows,
        Err(e) => {
            rollback_quietly(tx, path);
            return Err(e);
        }
    };

    tx.commit().map_err(|source| ImportError::Transaction {
        path: path.to_path_buf(),
        operation: "commit",
        source,
    })?;
    debug!(%table, rows = rows_inserted, "committed");

    Ok(ImportReport {
        path: path.to_path_buf(),
        table_name: table,
        columns,
        rows_inserted,
    })
}

fn read_header(path: &Path) -> ImportResult<Vec<String>> {
    let mut rdr = TsvReader::from_path(path)?;
    rdr.read_header().map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        operation: "read header",
        source,
    })
}

fn infer_types(path: &Path, column_count: usize) -> ImportResult<Vec<ColumnType>> {
    let mut rdr = TsvReader::from_path(path)?;
    let read_err = |source: csv::Error| ImportError::Read {
        path: path.to_path_buf(),
        operation: "infer column types",
        source,
    };
    rdr.read_header().map_err(read_err)?;
    infer_column_types(&mut rdr, column_count).map_err(read_err)
}

/// Drop (optionally), create and fill the table inside `tx`. Returns the inserted row count.
fn load_table(
    tx: &Transaction<'_>,
    path: &Path,
    table: &str,
    columns: &[ColumnSpec],
    options: &ImportOptions,
) -> ImportResult<u64> {
    let ddl_err = |operation: &'static str| {
        move |source: rusqlite::Error| ImportError::Ddl {
            path: path.to_path_buf(),
            table: table.to_string(),
            operation,
            source,
        }
    };

    if options.drop_existing {
        ensure_not_cancelled(&options.cancel, path)?;
        tx.execute(&build_drop_table(table), [])
            .map_err(ddl_err("drop table"))?;
        debug!(%table, "dropped existing table");
    }

    ensure_not_cancelled(&options.cancel, path)?;
    tx.execute(&create_table_sql(table, columns), [])
        .map_err(ddl_err("create table"))?;

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let mut stmt = tx
        .prepare(&build_insert(table, &names))
        .map_err(ddl_err("prepare insert for"))?;

    insert_rows(&mut stmt, path, table, columns.len(), &options.cancel)
}

fn insert_rows(
    stmt: &mut Statement<'_>,
    path: &Path,
    table: &str,
    column_count: usize,
    cancel: &CancellationToken,
) -> ImportResult<u64> {
    let read_err = |source: csv::Error| ImportError::Read {
        path: path.to_path_buf(),
        operation: "read rows",
        source,
    };
    let mut rdr = TsvReader::from_path(path)?;
    rdr.read_header().map_err(read_err)?;

    let mut record = ByteRecord::new();
    let mut inserted: u64 = 0;
    while rdr.read_record(&mut record).map_err(read_err)? {
        if is_blank_record(&record) {
            continue;
        }
        ensure_not_cancelled(cancel, path)?;

        let values: Vec<_> = (0..column_count).map(|i| field(&record, i)).collect();
        stmt.execute(params_from_iter(values.iter().map(|v| &**v)))
            .map_err(|source| ImportError::Insert {
                path: path.to_path_buf(),
                table: table.to_string(),
                line: record.position().map_or(0, |p| p.line()),
                source,
            })?;
        inserted += 1;

        if inserted % PROGRESS_EVERY == 0 {
            trace!(%table, rows = inserted, "insert progress");
        }
    }
    Ok(inserted)
}

fn ensure_not_cancelled(cancel: &CancellationToken, path: &Path) -> ImportResult<()> {
    if cancel.is_cancelled() {
        return Err(ImportError::Cancelled {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn rollback_quietly(tx: Transaction<'_>, path: &Path) {
    if let Err(error) = tx.rollback() {
        warn!(path = %path.display(), %error, "rollback failed");
    }
}
