//! Scanner module for path validation, traversal and content hashing.
//!
//! This module provides functionality for:
//! - Validating and canonicalizing the source and destination roots
//! - Containment checks that keep every read and write inside its root
//! - Sorted, non-link-following directory walking using walkdir
//! - Streaming content fingerprints (SHA-256 or BLAKE3)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`path_guard`]: Root validation and anti-traversal checks
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Streaming file fingerprints

pub mod hasher;
pub mod path_guard;
pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

// Re-export main types
pub use hasher::{Fingerprinter, HashAlgorithm, CHUNK_SIZE};
pub use path_guard::{ensure_writable, is_contained, validate_root, Root, RootRole};
pub use walker::Walker;

/// A fingerprinted file discovered during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Canonical absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Lowercase hex content digest
    pub fingerprint: String,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime, fingerprint: String) -> Self {
        Self {
            path,
            size,
            modified,
            fingerprint,
        }
    }
}
