use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod cli;
mod commands;
mod cycle;

use cli::{Cli, Commands};

fn open_log_file(path: &Path) -> std::io::Result<File> {
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Missing required configuration (a token or MAC absent from both the
    // flags and the environment) surfaces as a parse error; the scheduler
    // only distinguishes success from failure, so map it to exit code 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                // --help and --version land here.
                ExitCode::SUCCESS
            };
        }
    };

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let file_layer = match cli.log_file.as_deref().map(open_log_file).transpose() {
        Ok(file) => file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
        }),
        Err(e) => {
            eprintln!("Failed to open log file: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    let result = match cli.command {
        Commands::Log {
            mac,
            influx,
            tags,
            retry,
        } => commands::cmd_log(&mac, &influx, &tags, &retry).await,
        Commands::Recover {
            mac,
            since_hours,
            influx,
            tags,
            retry,
        } => commands::cmd_recover(&mac, since_hours, &influx, &tags, &retry).await,
        Commands::Import {
            file,
            mac,
            influx,
            tags,
            retry,
        } => commands::cmd_import(&file, &mac, &influx, &tags, &retry).await,
        Commands::Eve { action } => commands::cmd_eve(action).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
