//! Filesystem primitives for the artifact cache: an exclusive single-writer
//! file guard, family-scoped retention, and directory housekeeping.

mod dir;
mod error;
mod lock;
mod retention;

pub use dir::{FileEntry, ensure_dir, list_files, purge_dir};
pub use error::{Error, Result};
pub use lock::LockedFile;
pub use retention::{evict, retain_newest};
