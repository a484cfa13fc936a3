//! tsv2sqlite CLI.

use std::io::{self, IsTerminal};
use std::path::absolute;
use std::sync::Arc;

use clap::Parser;
use tsv2sqlite::database::{GeneratorOptions, generate_database};
use tsv2sqlite::ingestion::{
    FileObserver, ImportObserver, ImportOptions, ImportSeverity, TracingObserver,
};
use tsv2sqlite::logging::{LogConfig, LogFormat, init_logging};
use tsv2sqlite::types::RunSummary;
use tsv2sqlite::{ImportError, ImportResult};

mod cli;

use crate::cli::{Cli, LogFormatArg};

fn main() {
    let cli = Cli::parse();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let exit_code = match run(&cli) {
        Ok(summary) => {
            print_summary(&cli, &summary);
            0
        }
        Err(error) => {
            eprintln!("{error}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> ImportResult<RunSummary> {
    let input_dir = absolute(&cli.input_dir).map_err(|source| ImportError::Io {
        path: cli.input_dir.clone(),
        operation: "resolve",
        source,
    })?;
    let output_db = absolute(&cli.output_db).map_err(|source| ImportError::Io {
        path: cli.output_db.clone(),
        operation: "resolve",
        source,
    })?;

    let mut observers: Vec<Arc<dyn ImportObserver>> = vec![Arc::new(TracingObserver)];
    if let Some(path) = &cli.event_log {
        let file_observer = FileObserver::create(path).map_err(|source| ImportError::Io {
            path: path.clone(),
            operation: "open event log",
            source,
        })?;
        observers.push(Arc::new(file_observer));
    }

    let options = GeneratorOptions {
        input_dir,
        output_db,
        overwrite: cli.overwrite,
        import: ImportOptions {
            drop_existing: cli.drop,
            observer: Some(Arc::new(observers)),
            alert_at_or_above: ImportSeverity::Critical,
            ..Default::default()
        },
    };
    generate_database(&options)
}

fn print_summary(cli: &Cli, summary: &RunSummary) {
    if cli.json {
        match serde_json::to_string_pretty(summary) {
            Ok(text) => println!("{text}"),
            Err(error) => eprintln!("warning: failed to serialize summary: {error}"),
        }
    } else if cli.verbose > 0 {
        for table in &summary.tables {
            println!(
                "{} -> {} ({} columns, {} rows)",
                table.path.display(),
                table.table_name,
                table.columns.len(),
                table.rows_inserted
            );
        }
        println!("done: {}", cli.output_db.display());
    }
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig::from_verbosity(cli.verbose)
        .with_format(format)
        .with_timestamps(cli.log_timestamps)
        .with_ansi(cli.log_file.is_none() && io::stderr().is_terminal())
        .with_log_file(cli.log_file.clone())
}
