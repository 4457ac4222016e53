//! Relocation of duplicates into the destination tree.
//!
//! # Overview
//!
//! Each duplicate is moved to the same relative location under the
//! destination root it had under the source root. Every duplicate goes
//! through `pending -> validated -> (moved | skipped | failed)` exactly once;
//! a failure is recorded and the batch continues.
//!
//! # Example
//!
//! ```no_run
//! use dupemover::actions::{select_duplicates, RelocateConfig, RelocationEngine};
//! use dupemover::duplicates::DuplicateIndex;
//! use dupemover::output::NullAuditSink;
//! use dupemover::scanner::{validate_root, RootRole};
//! use std::path::Path;
//!
//! let source = validate_root(Path::new("./photos"), RootRole::Source).unwrap();
//! let dest = validate_root(Path::new("./dupes"), RootRole::Destination).unwrap();
//! let index = DuplicateIndex::new();
//!
//! let engine = RelocationEngine::new(RelocateConfig::default());
//! let report = engine.relocate(&select_duplicates(&index), &source, &dest, &mut NullAuditSink);
//! println!("{}", report.summary());
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use super::mover::{move_no_clobber, target_exists};
use crate::duplicates::DuplicateIndex;
use crate::error::DedupeError;
use crate::output::{record_or_warn, AuditRecord, AuditSink};
use crate::progress::ProgressCallback;
use crate::scanner::path_guard::canonical_entry;
use crate::scanner::{Fingerprinter, HashAlgorithm, Root};

/// Every duplicate in the index: all but the first file of each group, in
/// group order then within-group order.
#[must_use]
pub fn select_duplicates(index: &DuplicateIndex) -> Vec<PathBuf> {
    index
        .duplicate_groups()
        .flat_map(|group| group.duplicates().iter().map(|f| f.path.clone()))
        .collect()
}

/// Final state of one duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// File now lives at its target
    Moved,
    /// Dry run: validated, nothing touched
    Planned,
    /// Refused before any filesystem change (escape, symlink)
    Skipped,
    /// Move attempted and failed; file is still at the source
    Failed,
}

impl fmt::Display for MoveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Moved => "moved",
            Self::Planned => "planned",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of relocating a single duplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveResult {
    /// What happened
    pub status: MoveStatus,
    /// Path of the duplicate as selected
    pub source: PathBuf,
    /// Computed target, if validation got that far
    pub destination: Option<PathBuf>,
    /// Digest taken just before the move, if it could be computed
    pub fingerprint: Option<String>,
    /// Size in bytes, 0 if unknown
    pub size: u64,
    /// Modification time before the move
    pub modified: Option<SystemTime>,
    /// Failure description
    pub error: Option<String>,
}

impl MoveResult {
    fn pending(source: &Path) -> Self {
        Self {
            status: MoveStatus::Failed,
            source: source.to_path_buf(),
            destination: None,
            fingerprint: None,
            size: 0,
            modified: None,
            error: None,
        }
    }

    fn refuse(mut self, status: MoveStatus, err: &DedupeError) -> Self {
        self.status = status;
        self.error = Some(err.to_string());
        self
    }

    /// Whether the file reached (or, in a dry run, would reach) its target.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, MoveStatus::Moved | MoveStatus::Planned)
    }
}

/// Results of a relocation batch.
#[derive(Debug, Clone, Default)]
pub struct RelocationReport {
    /// One entry per duplicate attempted, in order
    pub results: Vec<MoveResult>,
    /// Set if the batch stopped early on a shutdown request
    pub interrupted: bool,
}

impl RelocationReport {
    fn count(&self, status: MoveStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Number of files moved.
    #[must_use]
    pub fn moved_count(&self) -> usize {
        self.count(MoveStatus::Moved)
    }

    /// Number of moves planned (dry run).
    #[must_use]
    pub fn planned_count(&self) -> usize {
        self.count(MoveStatus::Planned)
    }

    /// Number of duplicates refused before any change.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(MoveStatus::Skipped)
    }

    /// Number of failed moves.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(MoveStatus::Failed)
    }

    /// Bytes moved (or planned) successfully.
    #[must_use]
    pub fn bytes_relocated(&self) -> u64 {
        self.results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.size)
            .sum()
    }

    /// Human-readable summary of the batch.
    #[must_use]
    pub fn summary(&self) -> String {
        let planned = self.planned_count();
        let mut s = if planned > 0 {
            format!("Planned {} move(s)", planned)
        } else {
            format!("Moved {} file(s)", self.moved_count())
        };
        let failed = self.failed_count();
        let skipped = self.skipped_count();
        if failed > 0 {
            s.push_str(&format!(", {} failed", failed));
        }
        if skipped > 0 {
            s.push_str(&format!(", {} skipped", skipped));
        }
        if self.interrupted {
            s.push_str(" (interrupted)");
        }
        s
    }
}

/// Configuration for the relocation engine.
#[derive(Clone, Default)]
pub struct RelocateConfig {
    /// Digest used for the pre-move re-hash
    pub algorithm: HashAlgorithm,
    /// Validate and plan only; never touch the filesystem
    pub dry_run: bool,
    /// Optional shutdown flag for graceful termination
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for RelocateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelocateConfig")
            .field("algorithm", &self.algorithm)
            .field("dry_run", &self.dry_run)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl RelocateConfig {
    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enable/disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Moves duplicates from the source tree into the destination tree.
#[derive(Debug, Default)]
pub struct RelocationEngine {
    config: RelocateConfig,
    fingerprinter: Fingerprinter,
}

impl RelocationEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: RelocateConfig) -> Self {
        let fingerprinter = Fingerprinter::new(config.algorithm);
        Self {
            config,
            fingerprinter,
        }
    }

    /// Relocate every path in `duplicates`, in order.
    ///
    /// The caller must have checked the destination with
    /// [`ensure_writable`](crate::scanner::ensure_writable). One `moved`
    /// audit record is written per attempted duplicate. If the shutdown flag
    /// is set, the remaining duplicates are left untouched and the report is
    /// marked interrupted.
    pub fn relocate(
        &self,
        duplicates: &[PathBuf],
        source: &Root,
        dest: &Root,
        audit: &mut dyn AuditSink,
    ) -> RelocationReport {
        let mut report = RelocationReport::default();
        let total = duplicates.len();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("relocate", total);
        }

        for (i, path) in duplicates.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::warn!(
                    "Relocation interrupted, {} duplicate(s) left in place",
                    total - i
                );
                report.interrupted = true;
                break;
            }

            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(i + 1, &path.to_string_lossy());
            }

            let result = self.relocate_one(path, source, dest);
            match result.status {
                MoveStatus::Moved => log::info!(
                    "Moved duplicate {} -> {}",
                    path.display(),
                    result.destination.as_deref().unwrap_or(path).display()
                ),
                MoveStatus::Planned => log::info!(
                    "Would move {} -> {}",
                    path.display(),
                    result.destination.as_deref().unwrap_or(path).display()
                ),
                MoveStatus::Skipped | MoveStatus::Failed => log::warn!(
                    "Could not move {}: {}",
                    path.display(),
                    result.error.as_deref().unwrap_or("unknown error")
                ),
            }

            if let Some(ref callback) = self.config.progress_callback {
                callback.on_item_completed(result.size);
            }

            record_or_warn(audit, &AuditRecord::moved(&result));
            report.results.push(result);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("relocate");
        }

        log::info!("{}", report.summary());
        report
    }

    fn relocate_one(&self, path: &Path, source: &Root, dest: &Root) -> MoveResult {
        let mut result = MoveResult::pending(path);

        let link_meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) => return result.refuse(MoveStatus::Failed, &DedupeError::io(path, e)),
        };
        if link_meta.file_type().is_symlink() {
            let err = DedupeError::UnsafeInput {
                path: path.to_path_buf(),
                reason: "symbolic link",
            };
            return result.refuse(MoveStatus::Skipped, &err);
        }

        // Validate: canonical source inside source root, target inside dest root.
        let canonical = match canonical_entry(path) {
            Ok(p) => p,
            Err(e) => return result.refuse(MoveStatus::Failed, &DedupeError::io(path, e)),
        };
        let Ok(relative) = canonical.strip_prefix(source.path()) else {
            let err = DedupeError::PathEscape {
                path: canonical.clone(),
                root: source.path().to_path_buf(),
            };
            log::warn!("Security: {}", err);
            return result.refuse(MoveStatus::Skipped, &err);
        };

        let target = dest.path().join(relative);
        if relative.as_os_str().is_empty() || !dest.contains(&target) {
            let err = DedupeError::PathEscape {
                path: target,
                root: dest.path().to_path_buf(),
            };
            log::warn!("Security: {}", err);
            return result.refuse(MoveStatus::Skipped, &err);
        }
        result.destination = Some(target.clone());
        result.size = link_meta.len();
        result.modified = link_meta.modified().ok();

        if self.config.dry_run {
            if fs::symlink_metadata(&target).is_ok() {
                let err = DedupeError::io(&target, target_exists());
                return result.refuse(MoveStatus::Failed, &err);
            }
            result.status = MoveStatus::Planned;
            return result;
        }

        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return result.refuse(MoveStatus::Failed, &DedupeError::io(parent, e));
            }
        }

        // Best effort: a failed re-hash leaves the hash column empty.
        match self.fingerprinter.fingerprint(&canonical) {
            Ok(fp) => result.fingerprint = Some(fp),
            Err(e) => log::debug!("Could not re-hash {}: {}", canonical.display(), e),
        }

        match move_no_clobber(&canonical, &target) {
            Ok(method) => {
                log::debug!("{} via {:?}", target.display(), method);
                result.status = MoveStatus::Moved;
                result
            }
            Err(e) => result.refuse(MoveStatus::Failed, &DedupeError::io(&target, e)),
        }
    }
}
