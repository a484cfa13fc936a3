//! Destination database handling.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::{ImportError, ImportResult};
use crate::ingestion::{ImportOptions, discover_inputs, import_files};
use crate::types::RunSummary;

/// Options for a full directory-to-database run.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Directory containing `.tsv` files.
    pub input_dir: PathBuf,
    /// SQLite database file to create.
    pub output_db: PathBuf,
    /// Delete `output_db` first if it exists; otherwise an existing file is an error.
    pub overwrite: bool,
    /// Per-file import options.
    pub import: ImportOptions,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./tsv"),
            output_db: PathBuf::from("./out.db"),
            overwrite: false,
            import: ImportOptions::default(),
        }
    }
}

/// Open the output database, honoring the overwrite flag.
///
/// WAL journaling is requested; if SQLite refuses, the run continues with the default journal.
pub fn open_destination(path: &Path, overwrite: bool) -> ImportResult<Connection> {
    if overwrite {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "removed existing output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ImportError::Io {
                    path: path.to_path_buf(),
                    operation: "remove existing output",
                    source,
                });
            }
        }
    } else if path.exists() {
        return Err(ImportError::DestinationExists {
            path: path.to_path_buf(),
        });
    }

    let conn = Connection::open(path).map_err(|source| ImportError::Database {
        path: path.to_path_buf(),
        operation: "open database",
        source,
    })?;

    match conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0)) {
        Ok(mode) => debug!(%mode, "journal mode set"),
        Err(error) => warn!(path = %path.display(), %error, "failed to enable WAL journal mode"),
    }
    Ok(conn)
}

/// Build `options.output_db` from every `.tsv` file in `options.input_dir`.
///
/// The destination is checked before inputs are listed, and inputs are listed before the
/// destination is created, so a run with no inputs leaves no database behind.
pub fn generate_database(options: &GeneratorOptions) -> ImportResult<RunSummary> {
    if !options.overwrite && options.output_db.exists() {
        return Err(ImportError::DestinationExists {
            path: options.output_db.clone(),
        });
    }
    let files = discover_inputs(&options.input_dir)?;
    debug!(count = files.len(), dir = %options.input_dir.display(), "found input files");

    let mut conn = open_destination(&options.output_db, options.overwrite)?;
    import_files(&mut conn, &files, &options.import)
}
