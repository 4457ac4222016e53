//! Audit trail for scan and move events.
//!
//! The engine reports every processed, moved or failed file to an
//! [`AuditSink`]. Sinks are write-only: nothing in the engine reads the
//! trail back.
//!
//! - [`csv::CsvAuditLog`] writes the CSV audit log
//! - [`NullAuditSink`] discards everything
//! - `Vec<AuditRecord>` collects records in memory
//!
//! # Example
//!
//! ```no_run
//! use dupemover::output::{AuditSink, CsvAuditLog};
//! use std::path::Path;
//!
//! let mut log = CsvAuditLog::create(Path::new("audit.csv")).unwrap();
//! // pass `&mut log` to the scanner and relocation engine
//! ```

pub mod csv;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

use crate::actions::{MoveResult, MoveStatus};
use crate::error::DedupeError;
use crate::scanner::FileRecord;

pub use self::csv::{CsvAuditLog, AUDIT_HEADER};

/// Errors that can occur while writing audit records.
#[derive(Debug, Error)]
pub enum AuditError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Kind of event recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOperation {
    /// A file was fingerprinted during the scan
    Processed,
    /// A duplicate was relocated (or relocation was attempted)
    Moved,
}

/// Outcome of the recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    /// Event completed
    Success,
    /// Event failed or was refused
    Error,
    /// Dry run: the move was validated but not performed
    Planned,
}

/// One audit log row.
///
/// Field order matches [`AUDIT_HEADER`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    /// Local time the event was recorded (ISO 8601, microseconds)
    pub timestamp: String,
    /// Event kind
    pub operation: AuditOperation,
    /// File the event concerns
    pub original_path: String,
    /// Move target, empty for scan events
    pub destination_path: String,
    /// Content digest, empty when unknown
    pub file_hash: String,
    /// File size in bytes, 0 when unknown
    pub file_size: u64,
    /// Modification time in seconds since the Unix epoch, 0 when unknown
    pub modification_time: f64,
    /// Event outcome
    pub status: AuditStatus,
    /// Failure description, empty on success
    pub error_message: String,
}

impl AuditRecord {
    fn now(operation: AuditOperation, path: &Path, status: AuditStatus) -> Self {
        Self {
            timestamp: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            operation,
            original_path: path.to_string_lossy().into_owned(),
            destination_path: String::new(),
            file_hash: String::new(),
            file_size: 0,
            modification_time: 0.0,
            status,
            error_message: String::new(),
        }
    }

    /// A file fingerprinted successfully during the scan.
    #[must_use]
    pub fn processed(record: &FileRecord) -> Self {
        Self {
            file_hash: record.fingerprint.clone(),
            file_size: record.size,
            modification_time: epoch_seconds(record.modified),
            ..Self::now(AuditOperation::Processed, &record.path, AuditStatus::Success)
        }
    }

    /// A file that could not be fingerprinted during the scan.
    #[must_use]
    pub fn processed_failure(path: &Path, error: &DedupeError) -> Self {
        Self {
            error_message: error.to_string(),
            ..Self::now(AuditOperation::Processed, path, AuditStatus::Error)
        }
    }

    /// The outcome of one relocation attempt.
    #[must_use]
    pub fn moved(result: &MoveResult) -> Self {
        let status = match result.status {
            MoveStatus::Moved => AuditStatus::Success,
            MoveStatus::Planned => AuditStatus::Planned,
            MoveStatus::Skipped | MoveStatus::Failed => AuditStatus::Error,
        };
        Self {
            destination_path: result
                .destination
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_hash: result.fingerprint.clone().unwrap_or_default(),
            file_size: result.size,
            modification_time: result.modified.map_or(0.0, epoch_seconds),
            error_message: result.error.clone().unwrap_or_default(),
            ..Self::now(AuditOperation::Moved, &result.source, status)
        }
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
#[must_use]
pub fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Destination for audit records.
pub trait AuditSink {
    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written. Callers log the
    /// failure and keep going.
    fn record(&mut self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&mut self, _record: &AuditRecord) -> Result<(), AuditError> {
        Ok(())
    }
}

impl AuditSink for Vec<AuditRecord> {
    fn record(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Write a record, downgrading failures to a warning.
pub fn record_or_warn(sink: &mut dyn AuditSink, record: &AuditRecord) {
    if let Err(e) = sink.record(record) {
        log::warn!("Could not write to audit log: {}", e);
    }
}
