//! CSV audit log.
//!
//! The log is truncated and given a fixed header when it is created, then
//! receives one row per event. Each row is flushed as soon as it is written
//! so an interrupted run still leaves a complete record of what happened.
//!
//! # Columns
//!
//! `timestamp,operation,original_path,destination_path,file_hash,file_size,modification_time,status,error_message`

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{AuditError, AuditRecord, AuditSink};

/// Header row written when the log is initialized.
pub const AUDIT_HEADER: [&str; 9] = [
    "timestamp",
    "operation",
    "original_path",
    "destination_path",
    "file_hash",
    "file_size",
    "modification_time",
    "status",
    "error_message",
];

/// Audit sink backed by a CSV writer.
pub struct CsvAuditLog<W: Write = File> {
    writer: ::csv::Writer<W>,
    path: Option<PathBuf>,
}

impl CsvAuditLog<File> {
    /// Create (or truncate) the log file and write the header.
    ///
    /// # Errors
    ///
    /// Returns `AuditError` if the file cannot be created or written.
    pub fn create(path: &Path) -> Result<Self, AuditError> {
        let file = File::create(path)?;
        let mut log = Self::from_writer(file)?;
        log.path = Some(path.to_path_buf());
        log::info!("Initialized CSV log: {}", path.display());
        Ok(log)
    }
}

impl<W: Write> CsvAuditLog<W> {
    /// Wrap an arbitrary writer and write the header.
    ///
    /// # Errors
    ///
    /// Returns `AuditError` if the header cannot be written.
    pub fn from_writer(writer: W) -> Result<Self, AuditError> {
        let mut writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(AUDIT_HEADER)?;
        writer.flush()?;
        Ok(Self { writer, path: None })
    }

    /// Path of the log file, if it was created from one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flush and return the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn into_inner(self) -> Result<W, AuditError> {
        self.writer
            .into_inner()
            .map_err(|e| AuditError::Io(io::Error::other(e.to_string())))
    }
}

impl<W: Write> AuditSink for CsvAuditLog<W> {
    fn record(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}
