//! One complete run: validate, scan, select, relocate.
//!
//! [`execute`] wires the engine components together in the order the
//! guarantees depend on:
//!
//! 1. Both roots validated and canonicalized
//! 2. Destination writability checked, before any file is read
//! 3. Source scanned into a [`DuplicateIndex`](crate::duplicates::DuplicateIndex)
//! 4. Duplicates selected and relocated (skipped if there are none)

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use bytesize::ByteSize;
use yansi::Paint;

use crate::actions::{select_duplicates, RelocateConfig, RelocationEngine, RelocationReport};
use crate::duplicates::{DuplicateScanner, ScanConfig};
use crate::error::DedupeError;
use crate::output::AuditSink;
use crate::progress::ProgressCallback;
use crate::scanner::{ensure_writable, validate_root, HashAlgorithm, RootRole};

/// Inputs for a run.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Tree to scan
    pub source: PathBuf,
    /// Tree that receives duplicates
    pub dest: PathBuf,
    /// Fingerprint algorithm
    pub algorithm: HashAlgorithm,
    /// Plan moves without performing them
    pub dry_run: bool,
    /// Optional shutdown flag for graceful termination
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting
    pub progress: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("source", &self.source)
            .field("dest", &self.dest)
            .field("algorithm", &self.algorithm)
            .field("dry_run", &self.dry_run)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl RunOptions {
    /// Options for moving duplicates from `source` into `dest`.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            ..Self::default()
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Regular files fingerprinted
    pub files_scanned: usize,
    /// Distinct fingerprints
    pub unique_fingerprints: usize,
    /// Entries that could not be fingerprinted (symlinks, read errors, escapes)
    pub scan_failures: usize,
    /// Duplicates selected for relocation
    pub duplicates_found: usize,
    /// Bytes held by the duplicates
    pub duplicate_bytes: u64,
    /// Duplicates moved
    pub moved: usize,
    /// Duplicates planned (dry run)
    pub planned: usize,
    /// Moves that failed
    pub failed: usize,
    /// Duplicates refused before any change
    pub skipped: usize,
    /// Bytes moved (or planned)
    pub bytes_relocated: u64,
    /// The run stopped early on Ctrl+C
    pub interrupted: bool,
}

impl RunSummary {
    fn absorb(&mut self, report: &RelocationReport) {
        self.moved = report.moved_count();
        self.planned = report.planned_count();
        self.failed = report.failed_count();
        self.skipped = report.skipped_count();
        self.bytes_relocated = report.bytes_relocated();
        self.interrupted = report.interrupted;
    }

    /// Multi-line, colored report for the terminal.
    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("{}", "Summary".bold()),
            format!("  Files scanned:       {}", self.files_scanned),
            format!("  Unique fingerprints: {}", self.unique_fingerprints),
        ];
        if self.scan_failures > 0 {
            lines.push(format!("  Scan failures:       {}", self.scan_failures.yellow()));
        }
        lines.push(format!(
            "  Duplicates found:    {} ({})",
            self.duplicates_found,
            ByteSize::b(self.duplicate_bytes)
        ));
        if self.planned > 0 {
            lines.push(format!("  Planned moves:       {}", self.planned.cyan()));
        } else {
            lines.push(format!("  Moved:               {}", self.moved.green()));
        }
        if self.failed > 0 {
            lines.push(format!("  Failed:              {}", self.failed.red()));
        }
        if self.skipped > 0 {
            lines.push(format!("  Skipped:             {}", self.skipped.yellow()));
        }
        lines.push(format!(
            "  Bytes relocated:     {}",
            ByteSize::b(self.bytes_relocated)
        ));
        if self.interrupted {
            lines.push(format!("  {}", "Interrupted before completion".red().bold()));
        }
        lines.join("\n")
    }

    /// Single uncolored line with the final counts, for `--quiet` runs.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut line = format!(
            "scanned={} duplicates={} moved={} planned={} failed={} skipped={}",
            self.files_scanned,
            self.duplicates_found,
            self.moved,
            self.planned,
            self.failed,
            self.skipped
        );
        if self.interrupted {
            line.push_str(" interrupted");
        }
        line
    }
}

/// Run the whole pipeline.
///
/// # Errors
///
/// - [`DedupeError::InvalidPath`] if either root fails validation
/// - [`DedupeError::PermissionDenied`] if the destination is not writable
/// - [`DedupeError::Interrupted`] if Ctrl+C was observed during the scan
///
/// An interrupt during relocation is reported through
/// [`RunSummary::interrupted`] so the partial counts are not lost.
pub fn execute(options: &RunOptions, audit: &mut dyn AuditSink) -> Result<RunSummary, DedupeError> {
    let source = validate_root(&options.source, RootRole::Source)?;
    let dest = validate_root(&options.dest, RootRole::Destination)?;
    if !options.dry_run {
        ensure_writable(&dest)?;
    }

    let mut scan_config = ScanConfig::default().with_algorithm(options.algorithm);
    let mut relocate_config = RelocateConfig::default()
        .with_algorithm(options.algorithm)
        .with_dry_run(options.dry_run);
    if let Some(ref flag) = options.shutdown_flag {
        scan_config = scan_config.with_shutdown_flag(Arc::clone(flag));
        relocate_config = relocate_config.with_shutdown_flag(Arc::clone(flag));
    }
    if let Some(ref callback) = options.progress {
        scan_config = scan_config.with_progress_callback(Arc::clone(callback));
        relocate_config = relocate_config.with_progress_callback(Arc::clone(callback));
    }

    let (index, stats) = DuplicateScanner::new(scan_config).scan(&source, &dest, audit)?;

    let mut summary = RunSummary {
        files_scanned: stats.files_indexed,
        unique_fingerprints: index.len(),
        scan_failures: stats.failures(),
        ..RunSummary::default()
    };

    let duplicates = select_duplicates(&index);
    summary.duplicates_found = duplicates.len();
    summary.duplicate_bytes = index.wasted_bytes();
    log::info!("Duplicates found: {}", duplicates.len());

    if duplicates.is_empty() {
        log::info!("No duplicates found.");
        return Ok(summary);
    }

    let report = RelocationEngine::new(relocate_config).relocate(&duplicates, &source, &dest, audit);
    summary.absorb(&report);
    Ok(summary)
}
