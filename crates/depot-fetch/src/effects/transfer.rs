use std::path::Path;

use bytes::Bytes;
use depot_fs::LockedFile;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::http::HttpClient;
use crate::data::TransferOptions;
use crate::error::{Result, TransferError};

/// Streams a response body into a destination file owned exclusively for the
/// duration of the transfer.
///
/// Protocol, in order:
/// 1. create the parent directory
/// 2. take the exclusive lock without blocking, failing with
///    [`TransferError::AlreadyLocked`] if another writer holds it
/// 3. truncate, then open the source
/// 4. loop: stop on cancellation or an expired deadline, otherwise write at
///    most `buffer_size` bytes at the current offset
///
/// On any failure the partial file is removed while the lock is still held.
#[derive(Debug, Clone)]
pub struct TransferEngine<C> {
    client: C,
}

impl<C: HttpClient> TransferEngine<C> {
    pub fn new(client: C) -> Self { Self { client } }

    pub fn client(&self) -> &C { &self.client }

    /// Copy `source` to `destination`, returning the number of bytes written.
    pub async fn copy(
        &self,
        source: &Url,
        destination: &Path,
        options: &TransferOptions,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let started = Instant::now();

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|source| {
                TransferError::DirectoryCreateFailed {
                    path: parent.to_path_buf(),
                    source,
                }
            })?;
        }

        let locked = LockedFile::try_create(destination)?;
        debug!(url = %source, path = %destination.display(), "write lock acquired");

        match self.stream_into(&locked, source, options, cancel, started).await {
            Ok(bytes) => {
                info!(
                    url = %source,
                    path = %destination.display(),
                    bytes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "transfer complete"
                );
                Ok(bytes)
            }
            Err(e) => {
                if let Err(discard) = locked.discard() {
                    warn!(path = %destination.display(), error = %discard, "failed to remove partial file");
                }
                Err(e)
            }
        }
    }

    async fn stream_into(
        &self,
        locked: &LockedFile,
        source: &Url,
        options: &TransferOptions,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<u64> {
        let write_err = |source| TransferError::Write {
            path: locked.path().to_path_buf(),
            source,
        };

        locked.truncate()?;
        let mut file = tokio::fs::File::from_std(locked.try_clone_file()?);

        let mut body = self
            .client
            .open(source)
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        let chunk_len = options.chunk_len();
        let mut pending = Bytes::new();
        let mut offset = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(TransferError::Interrupted { bytes_written: offset });
            }
            let elapsed = started.elapsed();
            if elapsed > options.timeout {
                return Err(TransferError::TimedOut {
                    bytes_written: offset,
                    elapsed,
                });
            }

            if pending.is_empty() {
                let remaining = options.timeout.saturating_sub(elapsed);
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(TransferError::Interrupted { bytes_written: offset });
                    }
                    next = tokio::time::timeout(remaining, body.next()) => next,
                };
                match next {
                    Err(_) => {
                        return Err(TransferError::TimedOut {
                            bytes_written: offset,
                            elapsed:       started.elapsed(),
                        });
                    }
                    Ok(None) => break,
                    Ok(Some(Err(e))) => return Err(TransferError::Network(e.to_string())),
                    Ok(Some(Ok(chunk))) => pending = chunk,
                }
                continue;
            }

            let piece = pending.split_to(chunk_len.min(pending.len()));
            file.write_all(&piece).await.map_err(write_err)?;
            offset += piece.len() as u64;
        }

        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        Ok(offset)
    }
}
