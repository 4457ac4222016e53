//! dupemover - move duplicate files out of a tree
//!
//! Fingerprints every regular file under a source folder, keeps the first
//! copy of each distinct content where it is, and moves the other copies
//! under a destination folder at the same relative path. Moves never
//! overwrite, never leave the two roots, and never follow symbolic links.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{DedupeError, ExitCode};
use crate::output::{AuditSink, CsvAuditLog, NullAuditSink};
use crate::pipeline::{execute, RunOptions};
use crate::progress::Progress;

/// Run the application with parsed arguments.
///
/// # Errors
///
/// Returns an error for invalid configuration, invalid roots, an
/// unwritable destination, or a user interrupt. Per-file failures are not
/// errors; they are counted in the summary.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    log::debug!("Effective config: {:?}", config);

    let handler = signal::install_handler()?;

    let mut csv_sink = None;
    if let Some(ref path) = config.csv_log {
        match CsvAuditLog::create(path) {
            Ok(log) => csv_sink = Some(log),
            Err(e) => log::warn!(
                "Could not initialize CSV log {}: {}. Continuing without it.",
                path.display(),
                e
            ),
        }
    }
    let mut null_sink = NullAuditSink;
    let audit: &mut dyn AuditSink = match csv_sink {
        Some(ref mut sink) => sink,
        None => &mut null_sink,
    };

    let mut options = RunOptions::new(&cli.source_folder, &cli.dest_folder);
    options.algorithm = config.algorithm;
    options.dry_run = config.dry_run;
    options.shutdown_flag = Some(handler.get_flag());
    if config.progress {
        options.progress = Some(Arc::new(Progress::new()));
    }

    if config.dry_run {
        log::info!("Dry run: nothing will be moved");
    }

    let summary = execute(&options, audit)?;

    if cli.quiet {
        println!("{}", summary.one_line());
    } else {
        println!("{}", summary.render());
    }

    if summary.interrupted {
        return Err(DedupeError::Interrupted.into());
    }
    Ok(ExitCode::Success)
}
