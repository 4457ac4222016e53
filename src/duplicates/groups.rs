//! Fingerprint grouping.
//!
//! # Overview
//!
//! [`DuplicateIndex`] maps each content fingerprint to the files that carry
//! it, in the order they were inserted. Because the scanner inserts files in
//! walk order, the first file of every group is the survivor and the rest are
//! duplicates.
//!
//! # Example
//!
//! ```
//! use dupemover::duplicates::DuplicateIndex;
//! use dupemover::scanner::FileRecord;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let mut index = DuplicateIndex::new();
//! index.insert(FileRecord::new(PathBuf::from("/a.txt"), 5, SystemTime::now(), "h1".into()));
//! index.insert(FileRecord::new(PathBuf::from("/b.txt"), 5, SystemTime::now(), "h1".into()));
//! index.insert(FileRecord::new(PathBuf::from("/c.txt"), 3, SystemTime::now(), "h2".into()));
//!
//! assert_eq!(index.len(), 2);
//! assert_eq!(index.duplicate_count(), 1);
//! assert_eq!(index.get("h1").unwrap().survivor().path, PathBuf::from("/a.txt"));
//! ```

use std::collections::HashMap;

use crate::scanner::FileRecord;

/// All files sharing one content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintGroup {
    /// Lowercase hex digest shared by every file in the group
    pub fingerprint: String,
    /// Files in insertion order; never empty
    pub files: Vec<FileRecord>,
}

impl FingerprintGroup {
    fn new(first: FileRecord) -> Self {
        Self {
            fingerprint: first.fingerprint.clone(),
            files: vec![first],
        }
    }

    /// The file that stays in place (first inserted).
    #[must_use]
    pub fn survivor(&self) -> &FileRecord {
        &self.files[0]
    }

    /// Every file after the survivor.
    #[must_use]
    pub fn duplicates(&self) -> &[FileRecord] {
        &self.files[1..]
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false; a group is created with its first file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if this group holds more than one file.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }

    /// Bytes held by the duplicates.
    #[must_use]
    pub fn wasted_bytes(&self) -> u64 {
        self.duplicates().iter().map(|f| f.size).sum()
    }
}

/// Insertion-ordered map from fingerprint to [`FingerprintGroup`].
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    groups: Vec<FingerprintGroup>,
    positions: HashMap<String, usize>,
}

impl DuplicateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the group for its fingerprint.
    ///
    /// Returns `true` if the fingerprint was new (the file is a survivor).
    pub fn insert(&mut self, record: FileRecord) -> bool {
        if let Some(&pos) = self.positions.get(&record.fingerprint) {
            self.groups[pos].files.push(record);
            false
        } else {
            self.positions
                .insert(record.fingerprint.clone(), self.groups.len());
            self.groups.push(FingerprintGroup::new(record));
            true
        }
    }

    /// Number of distinct fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no file has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in first-seen order.
    #[must_use]
    pub fn groups(&self) -> &[FingerprintGroup] {
        &self.groups
    }

    /// Look up the group for a fingerprint.
    #[must_use]
    pub fn get(&self, fingerprint: &str) -> Option<&FingerprintGroup> {
        self.positions.get(fingerprint).map(|&pos| &self.groups[pos])
    }

    /// Total number of indexed files.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.groups.iter().map(FingerprintGroup::len).sum()
    }

    /// Number of files that are not survivors.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.total_files() - self.groups.len()
    }

    /// Bytes held by all duplicates.
    #[must_use]
    pub fn wasted_bytes(&self) -> u64 {
        self.groups.iter().map(FingerprintGroup::wasted_bytes).sum()
    }

    /// Groups that contain at least one duplicate.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = &FingerprintGroup> {
        self.groups.iter().filter(|g| g.has_duplicates())
    }
}
