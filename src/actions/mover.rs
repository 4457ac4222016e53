//! No-clobber file move.
//!
//! [`move_no_clobber`] never replaces an existing target and leaves the file
//! in exactly one place (source or target) whatever happens:
//!
//! - Same volume: the target name is claimed with a hard link, which fails
//!   atomically if it already exists, then the source name is removed.
//! - Filesystems without hard links: existence check, then `rename`.
//! - Across volumes: the content is copied into a freshly created target,
//!   synced, and only then is the source removed. A failed copy removes the
//!   partial target.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

/// How a file ended up at its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMethod {
    /// Hard link claimed the target, source name removed
    Linked,
    /// Plain rename after an existence check
    Renamed,
    /// Copied across volumes, source removed afterwards
    Copied,
}

pub(crate) fn target_exists() -> io::Error {
    io::Error::new(io::ErrorKind::AlreadyExists, "target already exists")
}

/// Move `src` to `dst` without ever overwriting `dst`.
///
/// # Errors
///
/// Returns an error of kind [`io::ErrorKind::AlreadyExists`] if `dst` exists,
/// or the underlying I/O error if the move fails. On error the file is still
/// at `src`.
pub fn move_no_clobber(src: &Path, dst: &Path) -> io::Result<MoveMethod> {
    match fs::hard_link(src, dst) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(src) {
                // Release the claim so the file is not left under two names.
                if let Err(undo) = fs::remove_file(dst) {
                    log::warn!("Could not remove link {}: {}", dst.display(), undo);
                }
                return Err(e);
            }
            Ok(MoveMethod::Linked)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(target_exists()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(src, dst).map(|()| MoveMethod::Copied)
        }
        Err(e) => {
            log::debug!(
                "Hard link unavailable for {} ({}), falling back to rename",
                dst.display(),
                e
            );
            rename_if_absent(src, dst)
        }
    }
}

fn rename_if_absent(src: &Path, dst: &Path) -> io::Result<MoveMethod> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(target_exists());
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(MoveMethod::Renamed),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(src, dst).map(|()| MoveMethod::Copied)
        }
        Err(e) => Err(e),
    }
}

fn copy_then_remove(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = File::open(src)?;
    let metadata = input.metadata()?;
    let mut output = match OpenOptions::new().write(true).create_new(true).open(dst) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(target_exists()),
        Err(e) => return Err(e),
    };

    let copied = io::copy(&mut input, &mut output)
        .and_then(|_| output.set_permissions(metadata.permissions()))
        .and_then(|()| match metadata.modified() {
            Ok(mtime) => output.set_modified(mtime),
            Err(_) => Ok(()),
        })
        .and_then(|()| output.sync_all());
    drop(output);

    if let Err(e) = copied {
        if let Err(cleanup) = fs::remove_file(dst) {
            log::warn!("Could not remove partial copy {}: {}", dst.display(), cleanup);
        }
        return Err(e);
    }

    if let Err(e) = fs::remove_file(src) {
        // Keep the original rather than leaving two copies behind.
        if let Err(cleanup) = fs::remove_file(dst) {
            log::warn!("Could not remove copy {}: {}", dst.display(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}
