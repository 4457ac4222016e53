//! Root validation and containment checks.
//!
//! Every path the engine reads or writes is checked against a canonical
//! [`Root`]. Comparisons are always made between canonicalized paths: a
//! lexical `starts_with` on unresolved strings would let `..` segments or
//! symlinked directories slip outside the sandbox.
//!
//! # Example
//!
//! ```no_run
//! use dupemover::scanner::path_guard::{is_contained, validate_root, RootRole};
//! use std::path::Path;
//!
//! let source = validate_root(Path::new("./photos"), RootRole::Source).unwrap();
//! assert!(is_contained(&source.path().join("a.jpg"), source.path()));
//! assert!(!is_contained(Path::new("/etc/passwd"), source.path()));
//! ```

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::DedupeError;

/// Which of the two run roots a path is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootRole {
    /// Tree that is scanned for duplicates
    Source,
    /// Tree that receives the relocated duplicates
    Destination,
}

impl RootRole {
    /// Lowercase name used in messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
        }
    }
}

impl fmt::Display for RootRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, canonical, existing and readable directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    path: PathBuf,
    role: RootRole,
}

impl Root {
    /// Canonical absolute path of the root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Role this root was validated for.
    #[must_use]
    pub fn role(&self) -> RootRole {
        self.role
    }

    /// Whether `candidate` lies inside this root.
    #[must_use]
    pub fn contains(&self, candidate: &Path) -> bool {
        is_contained(candidate, &self.path)
    }
}

/// Validate a root directory and resolve it to its canonical form.
///
/// # Errors
///
/// Returns [`DedupeError::InvalidPath`] if the path is empty, does not exist,
/// is not a directory, or cannot be listed.
pub fn validate_root(path: &Path, role: RootRole) -> Result<Root, DedupeError> {
    let invalid = |reason: &str| DedupeError::InvalidPath {
        role: role.as_str(),
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if path.as_os_str().is_empty() {
        return Err(invalid("cannot be empty"));
    }

    let canonical = dunce::canonicalize(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => invalid("does not exist"),
        io::ErrorKind::PermissionDenied => invalid("is not readable"),
        _ => invalid(&format!("cannot be resolved ({e})")),
    })?;

    let metadata = fs::metadata(&canonical).map_err(|e| invalid(&format!("cannot be read ({e})")))?;
    if !metadata.is_dir() {
        return Err(invalid("is not a directory"));
    }

    // Listing the directory is the portable readability check.
    fs::read_dir(&canonical).map_err(|_| invalid("is not readable"))?;

    log::debug!("Validated {} root: {}", role, canonical.display());

    Ok(Root {
        path: canonical,
        role,
    })
}

/// Check that the destination root accepts new files.
///
/// Performed once before any move begins by creating and removing a probe
/// file inside the root.
///
/// # Errors
///
/// Returns [`DedupeError::PermissionDenied`] if the probe cannot be created.
pub fn ensure_writable(root: &Root) -> Result<(), DedupeError> {
    let probe = root
        .path()
        .join(format!(".dupemover-write-probe-{}", std::process::id()));

    match OpenOptions::new().write(true).create_new(true).open(&probe) {
        Ok(file) => {
            drop(file);
            if let Err(e) = fs::remove_file(&probe) {
                log::warn!("Could not remove write probe {}: {}", probe.display(), e);
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Destination is not writable: {}", root.path().display());
            Err(DedupeError::PermissionDenied {
                path: root.path().to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}

/// Resolve a path to canonical form, allowing a tail that does not exist yet.
///
/// The deepest existing ancestor is canonicalized (resolving symlinks and
/// `..`), and the missing components are appended. A missing tail may only
/// contain normal components.
///
/// # Errors
///
/// Returns an error if the path cannot be made absolute, an existing ancestor
/// cannot be resolved, or the missing tail contains `..`.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let mut current = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let mut missing: Vec<OsString> = Vec::new();

    loop {
        match dunce::canonicalize(&current) {
            Ok(mut resolved) => {
                for name in missing.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => match current.components().next_back() {
                Some(Component::Normal(name)) => {
                    missing.push(name.to_os_string());
                    current.pop();
                }
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("unresolvable path component in {}", path.display()),
                    ));
                }
            },
            Err(e) => return Err(e),
        }
    }
}

/// Canonical path of a directory entry without following the entry itself.
///
/// The parent directory is canonicalized and the file name appended, so a
/// symbolic link resolves to its own location rather than its target.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be resolved.
pub fn canonical_entry(path: &Path) -> io::Result<PathBuf> {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            Ok(resolve_path(parent)?.join(name))
        }
        _ => resolve_path(path),
    }
}

/// Check whether `candidate` is equal to or a descendant of `root`.
///
/// Both sides are canonicalized before comparison. Paths that cannot be
/// resolved are treated as not contained.
#[must_use]
pub fn is_contained(candidate: &Path, root: &Path) -> bool {
    let Ok(root) = dunce::canonicalize(root) else {
        return false;
    };
    match resolve_path(candidate) {
        Ok(resolved) => resolved.starts_with(&root),
        Err(e) => {
            log::trace!("Cannot resolve {}: {}", candidate.display(), e);
            false
        }
    }
}
