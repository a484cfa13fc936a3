use std::path::PathBuf;

use thiserror::Error;

use crate::ingestion::observability::ImportSeverity;

/// Convenience result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Error type returned by the import pipeline.
///
/// Every variant names the file (or directory) and the operation that failed so the message can be
/// shown to a user without further wrapping.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Opening or reading a file failed.
    #[error("{operation} {}: {source}", path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The delimited reader failed while streaming records.
    #[error("{operation} {}: {source}", path.display())]
    Read {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: csv::Error,
    },

    /// The file has no header fields.
    #[error("empty header in {}", path.display())]
    EmptyHeader { path: PathBuf },

    /// No identifier could be derived from a file name.
    #[error("cannot derive a table name from {}", path.display())]
    InvalidName { path: PathBuf },

    /// Column names and column types disagree (internal invariant).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// Beginning or committing a transaction failed.
    #[error("{operation} transaction for {}: {source}", path.display())]
    Transaction {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A DROP / CREATE TABLE (or preparing the insert) failed.
    #[error("{operation} {table} ({}): {source}", path.display())]
    Ddl {
        path: PathBuf,
        table: String,
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Inserting a single row failed; the whole file was rolled back.
    #[error("insert row at line {line} into {table} ({}): {source}", path.display())]
    Insert {
        path: PathBuf,
        table: String,
        line: u64,
        #[source]
        source: rusqlite::Error,
    },

    /// The input directory contained no `.tsv` files.
    #[error("no .tsv files found in {}", dir.display())]
    NoInputFiles { dir: PathBuf },

    /// The output database exists and overwrite was not requested.
    #[error("output db already exists (use --overwrite): {}", path.display())]
    DestinationExists { path: PathBuf },

    /// Opening or configuring the destination database failed.
    #[error("{operation} {}: {source}", path.display())]
    Database {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The cancellation token fired while the file was being imported.
    #[error("import of {} cancelled", path.display())]
    Cancelled { path: PathBuf },

    /// The input glob pattern could not be built.
    #[error("invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl ImportError {
    /// Severity used for observer callbacks and alert thresholds.
    ///
    /// Infrastructure failures (filesystem, database, cancellation) are `Critical`; problems with
    /// the input data or generated schema are `Error`.
    pub fn severity(&self) -> ImportSeverity {
        match self {
            ImportError::Io { .. }
            | ImportError::Transaction { .. }
            | ImportError::Database { .. }
            | ImportError::Cancelled { .. } => ImportSeverity::Critical,
            ImportError::Read { source, .. } => match source.kind() {
                csv::ErrorKind::Io(_) => ImportSeverity::Critical,
                _ => ImportSeverity::Error,
            },
            ImportError::EmptyHeader { .. }
            | ImportError::InvalidName { .. }
            | ImportError::SchemaMismatch { .. }
            | ImportError::Ddl { .. }
            | ImportError::Insert { .. }
            | ImportError::NoInputFiles { .. }
            | ImportError::DestinationExists { .. }
            | ImportError::Pattern(_) => ImportSeverity::Error,
        }
    }
}
