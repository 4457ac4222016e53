//! Streaming content fingerprints.
//!
//! # Overview
//!
//! [`Fingerprinter`] reads a file in fixed 8 KiB chunks and feeds them
//! through a cryptographic digest, so memory use stays flat regardless of
//! file size. The result is a lowercase hex string that depends only on the
//! file's bytes.
//!
//! Symbolic links are never followed: they are rejected with
//! [`DedupeError::UnsafeInput`] before the file is opened, and the opened
//! handle must still be the same file that was checked.
//!
//! # Example
//!
//! ```no_run
//! use dupemover::scanner::hasher::{Fingerprinter, HashAlgorithm};
//! use std::path::Path;
//!
//! let fingerprinter = Fingerprinter::new(HashAlgorithm::Sha256);
//! let digest = fingerprinter.fingerprint(Path::new("photo.jpg")).unwrap();
//! assert_eq!(digest.len(), 64);
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::FileRecord;
use crate::error::DedupeError;

/// Size of each read while hashing.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Digest used for content fingerprints.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

enum DigestState {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(h) => format!("{:x}", h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Whether two metadata snapshots describe the same file on disk.
#[cfg(unix)]
fn same_file(before: &fs::Metadata, after: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    before.dev() == after.dev() && before.ino() == after.ino()
}

#[cfg(not(unix))]
fn same_file(before: &fs::Metadata, after: &fs::Metadata) -> bool {
    before.len() == after.len() && before.modified().ok() == after.modified().ok()
}

/// Computes content fingerprints for files.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fingerprinter {
    algorithm: HashAlgorithm,
}

impl Fingerprinter {
    /// Create a fingerprinter using the given digest.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Digest in use.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash everything a reader yields.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn fingerprint_reader<R: Read>(&self, mut reader: R) -> io::Result<String> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = [0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..n]);
        }
        Ok(state.finalize_hex())
    }

    /// Fingerprint a single file.
    ///
    /// # Errors
    ///
    /// - [`DedupeError::UnsafeInput`] if the path is a symbolic link or not a regular file
    /// - [`DedupeError::Io`] if the file cannot be opened or read
    pub fn fingerprint(&self, path: &Path) -> Result<String, DedupeError> {
        self.record(path).map(|record| record.fingerprint)
    }

    /// Fingerprint a file and capture its size and modification time.
    ///
    /// # Errors
    ///
    /// Same as [`Fingerprinter::fingerprint`].
    pub fn record(&self, path: &Path) -> Result<FileRecord, DedupeError> {
        let link_meta = fs::symlink_metadata(path).map_err(|e| DedupeError::io(path, e))?;
        if link_meta.file_type().is_symlink() {
            return Err(DedupeError::UnsafeInput {
                path: path.to_path_buf(),
                reason: "symbolic link",
            });
        }
        if !link_meta.is_file() {
            return Err(DedupeError::UnsafeInput {
                path: path.to_path_buf(),
                reason: "non-regular file",
            });
        }

        let file = File::open(path).map_err(|e| DedupeError::io(path, e))?;
        let metadata = file.metadata().map_err(|e| DedupeError::io(path, e))?;
        if !metadata.is_file() || !same_file(&link_meta, &metadata) {
            return Err(DedupeError::UnsafeInput {
                path: path.to_path_buf(),
                reason: "file replaced while opening",
            });
        }
        let fingerprint = self
            .fingerprint_reader(&file)
            .map_err(|e| DedupeError::io(path, e))?;

        log::trace!("{} {}", fingerprint, path.display());

        Ok(FileRecord {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            fingerprint,
        })
    }
}
