//! Error taxonomy, exit codes and structured error output.
//!
//! [`DedupeError`] covers every failure the engine can produce. Some variants
//! are fatal at startup ([`DedupeError::InvalidPath`],
//! [`DedupeError::PermissionDenied`]); the rest are per-file and are recorded
//! and skipped without aborting the batch.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Errors produced by path validation, scanning and relocation.
#[derive(Debug, Error)]
pub enum DedupeError {
    /// A root is empty, missing, not a directory or unreadable.
    #[error("{role} path {reason}: {path}")]
    InvalidPath {
        /// Which root failed ("source" or "destination")
        role: &'static str,
        /// The path as given
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The destination root cannot be written to.
    #[error("no write permission for destination {path}: {reason}")]
    PermissionDenied {
        /// Destination root
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// A symbolic link (or other non-regular entry) where a regular file was expected.
    #[error("skipping {reason}: {path}")]
    UnsafeInput {
        /// Offending path
        path: PathBuf,
        /// Short description, e.g. "symbolic link"
        reason: &'static str,
    },

    /// Read, write or move failure for a single file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A candidate or target path resolved outside its declared root.
    #[error("path escapes {root}: {path}")]
    PathEscape {
        /// Offending path
        path: PathBuf,
        /// Root it should have stayed inside
        root: PathBuf,
    },

    /// The user interrupted the run.
    #[error("operation cancelled by user")]
    Interrupted,
}

impl DedupeError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::InvalidPath { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::UnsafeInput { path, .. }
            | Self::Io { path, .. }
            | Self::PathEscape { path, .. } => Some(path),
            Self::Interrupted => None,
        }
    }

    /// Short machine-readable label for the error kind.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::InvalidPath { .. } => "invalid-path",
            Self::PermissionDenied { .. } => "permission-denied",
            Self::UnsafeInput { .. } => "unsafe-input",
            Self::Io { .. } => "io-error",
            Self::PathEscape { .. } => "path-escape",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Exit codes for the dupemover application.
///
/// Every failure, including a user interrupt, exits with status 1. The
/// variants differ only in their machine-readable prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Run completed (with or without duplicates, with or without per-file failures).
    Success,
    /// Validation, permission or OS error.
    GeneralError,
    /// Interrupted by user (Ctrl+C).
    Interrupted,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::GeneralError | Self::Interrupted => 1,
        }
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DM000",
            Self::GeneralError => "DM001",
            Self::Interrupted => "DM130",
        }
    }

    /// Pick the exit code for an application-level error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<DedupeError>() {
            Some(DedupeError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DM001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Error kind label when the error came from the engine
    pub kind: Option<&'static str>,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            kind: err.downcast_ref::<DedupeError>().map(DedupeError::kind_label),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
