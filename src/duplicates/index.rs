//! Source tree scan that builds the [`DuplicateIndex`].
//!
//! # Overview
//!
//! [`DuplicateScanner::scan`] walks the source root in sorted depth-first
//! order, fingerprints every regular file and groups the results. Each file
//! is checked against both roots before it is read:
//!
//! 1. Outside the source root: skipped with a warning ([`DedupeError::PathEscape`])
//! 2. Inside the destination root: skipped silently (the subtree is also pruned)
//! 3. Symbolic link or unreadable: recorded as a failure, scan continues
//!
//! One `processed` audit record is emitted per file, success or failure.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::DuplicateIndex;
use crate::error::DedupeError;
use crate::output::{record_or_warn, AuditRecord, AuditSink};
use crate::progress::ProgressCallback;
use crate::scanner::path_guard::canonical_entry;
use crate::scanner::{Fingerprinter, HashAlgorithm, Root, Walker};

/// Configuration for a source scan.
#[derive(Clone, Default)]
pub struct ScanConfig {
    /// Digest used for fingerprints
    pub algorithm: HashAlgorithm,
    /// Optional shutdown flag for graceful termination
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("algorithm", &self.algorithm)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ScanConfig {
    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
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

/// Counters collected during a scan.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Entries yielded by the walker
    pub files_seen: usize,
    /// Files fingerprinted and added to the index
    pub files_indexed: usize,
    /// Symbolic links and other non-regular entries skipped
    pub unsafe_skipped: usize,
    /// Entries that resolved outside the source root
    pub escaped: usize,
    /// Entries skipped because they live under the destination root
    pub in_destination: usize,
    /// Bytes read while fingerprinting
    pub bytes_scanned: u64,
    /// Every per-file failure, in encounter order
    pub errors: Vec<DedupeError>,
}

impl ScanStats {
    /// Number of entries that could not be indexed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.errors.len()
    }
}

/// Builds a [`DuplicateIndex`] from a source tree.
#[derive(Debug, Default)]
pub struct DuplicateScanner {
    config: ScanConfig,
    fingerprinter: Fingerprinter,
}

impl DuplicateScanner {
    /// Create a scanner with the given configuration.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        let fingerprinter = Fingerprinter::new(config.algorithm);
        Self {
            config,
            fingerprinter,
        }
    }

    /// Scan `source`, excluding anything under `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`DedupeError::Interrupted`] if the shutdown flag is set.
    /// Per-file failures never abort the scan; they are returned in
    /// [`ScanStats::errors`].
    pub fn scan(
        &self,
        source: &Root,
        dest: &Root,
        audit: &mut dyn AuditSink,
    ) -> Result<(DuplicateIndex, ScanStats), DedupeError> {
        let mut index = DuplicateIndex::new();
        let mut stats = ScanStats::default();

        log::info!("Scanning {}", source.path().display());

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("scan", 0);
        }

        let mut walker = Walker::new(source.path()).exclude(dest.path());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        for entry in walker.walk() {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    if let Some(p) = e.path() {
                        record_or_warn(audit, &AuditRecord::processed_failure(p, &e));
                    }
                    stats.errors.push(e);
                    continue;
                }
            };
            stats.files_seen += 1;

            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(stats.files_seen, &path.to_string_lossy());
            }

            let resolved = match canonical_entry(&path) {
                Ok(resolved) => resolved,
                Err(e) => {
                    let err = DedupeError::io(&path, e);
                    log::warn!("{}", err);
                    record_or_warn(audit, &AuditRecord::processed_failure(&path, &err));
                    stats.errors.push(err);
                    continue;
                }
            };

            if !resolved.starts_with(source.path()) {
                let err = DedupeError::PathEscape {
                    path: resolved,
                    root: source.path().to_path_buf(),
                };
                log::warn!("Security: {}", err);
                record_or_warn(audit, &AuditRecord::processed_failure(&path, &err));
                stats.escaped += 1;
                stats.errors.push(err);
                continue;
            }

            if resolved.starts_with(dest.path()) {
                stats.in_destination += 1;
                continue;
            }

            match self.fingerprinter.record(&resolved) {
                Ok(record) => {
                    record_or_warn(audit, &AuditRecord::processed(&record));
                    stats.files_indexed += 1;
                    stats.bytes_scanned += record.size;
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_item_completed(record.size);
                    }
                    index.insert(record);
                }
                Err(err) => {
                    if matches!(err, DedupeError::UnsafeInput { .. }) {
                        stats.unsafe_skipped += 1;
                        log::info!("{}", err);
                    } else {
                        log::warn!("Error processing {}: {}", resolved.display(), err);
                    }
                    record_or_warn(audit, &AuditRecord::processed_failure(&resolved, &err));
                    stats.errors.push(err);
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("scan");
        }

        if self.config.is_shutdown_requested() {
            log::warn!("Scan interrupted after {} files", stats.files_seen);
            return Err(DedupeError::Interrupted);
        }

        log::info!("Unique files found: {}", index.len());
        log::debug!(
            "Scan complete: {} indexed, {} failures, {} skipped in destination",
            stats.files_indexed,
            stats.failures(),
            stats.in_destination
        );

        Ok((index, stats))
    }
}
