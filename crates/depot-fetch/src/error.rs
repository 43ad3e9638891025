use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreateFailed {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is being written by another writer", path.display())]
    AlreadyLocked { path: PathBuf },

    #[error("transfer interrupted after {bytes_written} bytes")]
    Interrupted { bytes_written: u64 },

    #[error("transfer timed out after {elapsed:?} ({bytes_written} bytes written)")]
    TimedOut { bytes_written: u64, elapsed: Duration },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Fs(depot_fs::Error),
}

impl TransferError {
    /// Bytes that reached the destination before the transfer stopped.
    pub fn bytes_written(&self) -> Option<u64> {
        match self {
            Self::Interrupted { bytes_written } | Self::TimedOut { bytes_written, .. } => {
                Some(*bytes_written)
            }
            _ => None,
        }
    }
}

impl From<depot_fs::Error> for TransferError {
    fn from(e: depot_fs::Error) -> Self {
        match e {
            depot_fs::Error::AlreadyLocked { path } => Self::AlreadyLocked { path },
            other => Self::Fs(other),
        }
    }
}
