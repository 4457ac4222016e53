//! File actions module.
//!
//! This module provides functionality for:
//! - Selecting the duplicates to relocate from a [`DuplicateIndex`](crate::duplicates::DuplicateIndex)
//! - Moving them under the destination root, mirroring their relative paths
//! - A no-clobber move primitive that works within and across volumes
//!
//! ```no_run
//! use dupemover::actions::mover::move_no_clobber;
//! use std::path::Path;
//!
//! move_no_clobber(Path::new("src/b.txt"), Path::new("dupes/b.txt")).unwrap();
//! ```

pub mod mover;
pub mod relocate;

// Re-export commonly used types
pub use mover::{move_no_clobber, MoveMethod};
pub use relocate::{
    select_duplicates, MoveResult, MoveStatus, RelocateConfig, RelocationEngine,
    RelocationReport,
};
