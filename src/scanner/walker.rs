//! Deterministic directory traversal.
//!
//! # Overview
//!
//! [`Walker`] enumerates every non-directory entry below a root using
//! [`walkdir`], sorted by file name at each level, depth-first. The order is
//! therefore stable across runs on an unchanged tree, which is what makes
//! "first seen wins" survivor selection deterministic.
//!
//! Symbolic links are never followed. They are still yielded so the caller
//! can record them as skipped; excluded subtrees (the destination root) are
//! pruned before they are entered.
//!
//! # Example
//!
//! ```no_run
//! use dupemover::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/data/photos")).exclude(Path::new("/data/photos/dupes"));
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::error::DedupeError;

/// Sequential, sorted directory walker.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Subtrees that are never entered
    excluded: Vec<PathBuf>,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            excluded: Vec::new(),
            shutdown_flag: None,
        }
    }

    /// Never descend into `path` (or yield anything below it).
    #[must_use]
    pub fn exclude(mut self, path: &Path) -> Self {
        self.excluded.push(path.to_path_buf());
        self
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set, iteration stops before the next entry.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|ex| path.starts_with(ex))
    }

    /// Walk the tree, yielding regular files and symbolic links.
    ///
    /// Errors (unreadable directories, entries vanishing mid-walk) are
    /// yielded as [`DedupeError::Io`] values rather than stopping iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, DedupeError>> + '_ {
        let mut entries = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| {
                if self.is_excluded(e.path()) {
                    log::debug!("Pruning excluded subtree: {}", e.path().display());
                    false
                } else {
                    true
                }
            });

        std::iter::from_fn(move || loop {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entries.next()? {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        continue;
                    }
                    if file_type.is_file() || file_type.is_symlink() {
                        return Some(Ok(entry.into_path()));
                    }
                    log::debug!("Skipping special file: {}", entry.path().display());
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    return Some(Err(DedupeError::io(path, e.into())));
                }
            }
        })
    }
}
