//! Core data model for the import pipeline.
//!
//! A TSV file becomes a table described by a list of [`ColumnSpec`]s; importing it produces an
//! [`ImportReport`]. Reports for a whole directory are collected into a [`RunSummary`].

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Storage class inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// Every non-empty value parses as a base-10 `i64`.
    Integer,
    /// Every non-empty value parses as an `f64`.
    Real,
    /// Anything else, including columns with no values at all.
    Text,
}

impl ColumnType {
    /// SQL type name used in `CREATE TABLE`.
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A single named, typed column of a generated table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    /// Sanitized, deduplicated column name.
    pub name: String,
    /// Inferred column type.
    pub column_type: ColumnType,
    /// Whether the column is declared `PRIMARY KEY`.
    pub primary_key: bool,
}

impl ColumnSpec {
    /// Create a non-key column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
        }
    }
}

/// Outcome of importing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Source file.
    pub path: PathBuf,
    /// Table the rows were written to.
    pub table_name: String,
    /// Columns of the generated table.
    pub columns: Vec<ColumnSpec>,
    /// Number of non-blank data rows inserted.
    pub rows_inserted: u64,
}

/// Reports for every file of a run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub tables: Vec<ImportReport>,
}

impl RunSummary {
    /// Total rows inserted across all files.
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_inserted).sum()
    }

    /// Look up the report for a table by name.
    pub fn table(&self, name: &str) -> Option<&ImportReport> {
        self.tables.iter().find(|t| t.table_name == name)
    }
}
