//! Import lifecycle events and the observers that consume them.
//!
//! [`import_file`](super::import_file) emits one [`ImportEvent::SchemaInferred`] once a file's
//! columns are known, then exactly one of [`ImportEvent::Committed`] or [`ImportEvent::Failed`].
//! A file that fails before its schema is known only produces `Failed`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::error::ImportError;
use crate::types::{ColumnSpec, ImportReport};

/// How serious a failed import is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSeverity {
    /// The file's contents or generated schema were rejected.
    Error,
    /// Filesystem, database or cancellation failure.
    Critical,
}

/// A step in the import of one file.
#[derive(Debug, Clone, Copy)]
pub enum ImportEvent<'a> {
    /// Columns and types are known; the transaction has not started yet.
    SchemaInferred {
        path: &'a Path,
        table: &'a str,
        columns: &'a [ColumnSpec],
    },
    /// The file's transaction committed.
    Committed(&'a ImportReport),
    /// The file was rolled back, or failed before anything was written.
    Failed {
        path: &'a Path,
        error: &'a ImportError,
        severity: ImportSeverity,
        /// `severity` reached [`ImportOptions::alert_at_or_above`](super::ImportOptions).
        alert: bool,
    },
}

impl ImportEvent<'_> {
    /// The input file the event is about.
    pub fn path(&self) -> &Path {
        match self {
            ImportEvent::SchemaInferred { path, .. } | ImportEvent::Failed { path, .. } => path,
            ImportEvent::Committed(report) => &report.path,
        }
    }

    fn to_json(self) -> Value {
        match self {
            ImportEvent::SchemaInferred {
                path,
                table,
                columns,
            } => json!({
                "event": "schema_inferred",
                "path": path.display().to_string(),
                "table": table,
                "columns": columns,
            }),
            ImportEvent::Committed(report) => json!({
                "event": "committed",
                "path": report.path.display().to_string(),
                "table": report.table_name,
                "columns": report.columns.len(),
                "rows": report.rows_inserted,
            }),
            ImportEvent::Failed {
                path,
                error,
                severity,
                alert,
            } => json!({
                "event": "failed",
                "path": path.display().to_string(),
                "severity": severity,
                "alert": alert,
                "error": error.to_string(),
            }),
        }
    }
}

/// Receives [`ImportEvent`]s as files are imported.
///
/// Callbacks run on the importing thread, between database calls.
pub trait ImportObserver: Send + Sync {
    fn on_event(&self, event: &ImportEvent<'_>);
}

impl ImportObserver for [Arc<dyn ImportObserver>] {
    fn on_event(&self, event: &ImportEvent<'_>) {
        for observer in self {
            observer.on_event(event);
        }
    }
}

impl ImportObserver for Vec<Arc<dyn ImportObserver>> {
    fn on_event(&self, event: &ImportEvent<'_>) {
        self.as_slice().on_event(event);
    }
}

/// Reports outcomes as `tracing` events. Alerts are logged with `alert = true`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ImportObserver for TracingObserver {
    fn on_event(&self, event: &ImportEvent<'_>) {
        match *event {
            ImportEvent::SchemaInferred { .. } => {}
            ImportEvent::Committed(report) => info!(
                path = %report.path.display(),
                table = %report.table_name,
                rows = report.rows_inserted,
                columns = report.columns.len(),
                "table imported"
            ),
            ImportEvent::Failed {
                path,
                error,
                severity,
                alert,
            } => error!(path = %path.display(), ?severity, alert, %error, "import failed"),
        }
    }
}

/// Appends every event as one JSON object per line.
#[derive(Debug)]
pub struct FileObserver {
    file: Mutex<File>,
}

impl FileObserver {
    /// Open (or create) `path` for appending.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ImportObserver for FileObserver {
    fn on_event(&self, event: &ImportEvent<'_>) {
        let mut line = event.to_json();
        line["ts"] = json!(unix_ts());

        let Ok(mut file) = self.file.lock() else {
            return;
        };
        if let Err(error) = writeln!(file, "{line}") {
            warn!(path = %event.path().display(), %error, "failed to write event log");
        }
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
