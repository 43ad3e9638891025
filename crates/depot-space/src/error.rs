use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to query {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed: {cmd}, source: {source}")]
    CommandFailed { cmd: String, source: std::io::Error },

    #[error("{cmd} exited with {status}: {stderr}")]
    CommandStatus { cmd: String, status: String, stderr: String },

    #[error("unrecognized probe output: {0}")]
    Parse(String),

    #[error("probe unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpaceError {
    #[error("no disk space sample within {waited:?}")]
    NoSample { waited: Duration },

    #[error("space monitor stopped before producing a sample")]
    Stopped,
}
