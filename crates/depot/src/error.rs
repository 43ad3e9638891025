use std::io;
use std::path::PathBuf;

use depot_core::{CatalogError, StorageQuantity};
use depot_fetch::TransferError;
use depot_space::SpaceError;
use thiserror::Error;
use url::Url;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, DownloadError>;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    UnknownArtifact(#[from] CatalogError),

    #[error("could not lock {url} after {attempts} attempts")]
    LockUnavailable { url: Url, attempts: u32 },

    #[error("disk space unknown: {0}")]
    SpaceUnavailable(#[from] SpaceError),

    #[error("insufficient disk space: {available} available, {required} required")]
    InsufficientSpace {
        available: StorageQuantity,
        required:  StorageQuantity,
    },

    #[error("{url}: expected {expected} bytes, got {actual}")]
    LengthMismatch { url: Url, expected: u64, actual: u64 },

    #[error("{url}: checksum mismatch, expected {expected}, got {actual}")]
    ChecksumMismatch {
        url:      Url,
        expected: String,
        actual:   String,
    },

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
