//! Ingestion pipeline: reading TSV files, inferring their schema, and loading them into SQLite.
//!
//! Most callers should use [`import_dir`] (or [`crate::database::generate_database`], which also
//! prepares the destination file). The pieces are available separately:
//!
//! - [`tsv`]: tab-delimited record reader
//! - [`infer`]: column type inference
//! - [`statement`]: `CREATE TABLE` / `INSERT` / `DROP TABLE` text
//! - [`import`]: the per-file transactional import
//! - [`observability`]: import events and observers

pub mod import;
pub mod infer;
pub mod observability;
pub mod statement;
pub mod tsv;

pub use import::{
    ImportOptions, discover_inputs, import_dir, import_file, import_files, table_name_for,
};
pub use observability::{
    FileObserver, ImportEvent, ImportObserver, ImportSeverity, TracingObserver,
};
