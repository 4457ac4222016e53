//! Command-line interface definitions for dupemover.
//!
//! # Example
//!
//! ```bash
//! # Move duplicates out of ~/Photos into ~/Photos-dupes, keeping an audit log
//! dupemover --source-folder ~/Photos --dest-folder ~/Photos-dupes --csv-log moves.csv
//!
//! # See what would move without touching anything
//! dupemover --source-folder ~/Photos --dest-folder ~/Photos-dupes --dry-run
//!
//! # Faster fingerprints, debug output
//! dupemover -v --algorithm blake3 --source-folder ./data --dest-folder ./dupes
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::scanner::HashAlgorithm;

/// Find duplicate files by content and move the extra copies elsewhere.
///
/// Every regular file under the source folder is fingerprinted. For each set
/// of identical files the first one found (in sorted path order) stays where
/// it is; the others are moved under the destination folder, keeping their
/// relative paths. Existing files in the destination are never overwritten.
#[derive(Debug, Parser)]
#[command(name = "dupemover")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Folder to scan for duplicate files
    #[arg(long, value_name = "PATH")]
    pub source_folder: PathBuf,

    /// Existing, writable folder that receives the duplicates
    #[arg(long, value_name = "PATH")]
    pub dest_folder: PathBuf,

    /// Write a CSV audit log of every processed and moved file
    #[arg(long, value_name = "PATH")]
    pub csv_log: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only errors and a one-line summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Content fingerprint algorithm [default: sha256]
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Plan and log every move without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Do not show progress bars
    #[arg(long)]
    pub no_progress: bool,
}
