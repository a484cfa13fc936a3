//! `tsv2sqlite` loads a directory of tab-separated files into a SQLite database, one table per
//! file, inferring each table's schema from the data.
//!
//! For every `*.tsv` file (processed in path order):
//!
//! - the table name is the file name without extension, sanitized into an identifier
//! - header fields become column names (sanitized, then deduplicated with `_2`, `_3`, ...)
//! - one full pass over the rows infers each column as `INTEGER`, `REAL` or `TEXT`
//! - an `INTEGER` column named `id` becomes the primary key
//! - a second pass inserts every non-blank row inside a single transaction
//!
//! A failing file is rolled back and stops the run; files committed before it are kept.
//!
//! ## Quick example
//!
//! ```no_run
//! use tsv2sqlite::database::{generate_database, GeneratorOptions};
//!
//! # fn main() -> Result<(), tsv2sqlite::ImportError> {
//! let summary = generate_database(&GeneratorOptions {
//!     input_dir: "data/tsv".into(),
//!     output_db: "data/out.db".into(),
//!     overwrite: true,
//!     ..Default::default()
//! })?;
//! for table in &summary.tables {
//!     println!("{} rows={}", table.table_name, table.rows_inserted);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Importing into an existing connection:
//!
//! ```no_run
//! use rusqlite::Connection;
//! use tsv2sqlite::ingestion::{import_file, ImportOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conn = Connection::open_in_memory()?;
//! let opts = ImportOptions { drop_existing: true, ..Default::default() };
//! let report = import_file(&mut conn, "people.tsv", &opts)?;
//! assert_eq!(report.table_name, "people");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: reader, type inference, statement builder and the per-file import
//! - [`database`]: destination file handling and the full directory run
//! - [`ident`]: identifier sanitizing, quoting and deduplication
//! - [`types`]: column and report types
//! - [`cancel`]: cooperative cancellation
//! - [`logging`]: `tracing-subscriber` setup for the binary
//! - [`error`]: the error type shared by everything above

pub mod cancel;
pub mod database;
pub mod error;
pub mod ident;
pub mod ingestion;
pub mod logging;
pub mod types;

pub use cancel::CancellationToken;
pub use error::{ImportError, ImportResult};
