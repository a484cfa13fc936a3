//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(
    name = "tsv2sqlite",
    version,
    about = "Load a directory of .tsv files into a SQLite database",
    long_about = "Load every .tsv file in a directory into a SQLite database.\n\n\
                  Each file becomes a table named after the file. Column types are inferred\n\
                  from the data and each file is imported in its own transaction."
)]
pub struct Cli {
    /// Input directory containing .tsv files.
    #[arg(long = "in", value_name = "DIR", default_value = "./tsv")]
    pub input_dir: PathBuf,

    /// Output SQLite database file path.
    #[arg(long = "out", value_name = "FILE", default_value = "./out.db")]
    pub output_db: PathBuf,

    /// Overwrite the output database if it already exists.
    #[arg(long)]
    pub overwrite: bool,

    /// Drop and recreate tables before importing.
    #[arg(long)]
    pub drop: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Prefix log lines with a timestamp (pretty and compact formats).
    #[arg(long = "log-timestamps")]
    pub log_timestamps: bool,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append import events to this file as JSON lines.
    #[arg(long = "event-log", value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
