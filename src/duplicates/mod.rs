//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Scanning the source tree into content fingerprints
//! - Grouping files by fingerprint in first-seen order
//! - Survivor / duplicate classification

pub mod groups;
pub mod index;

pub use groups::{DuplicateIndex, FingerprintGroup};
pub use index::{DuplicateScanner, ScanConfig, ScanStats};
