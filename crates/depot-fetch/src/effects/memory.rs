use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use thiserror::Error;
use url::Url;

use super::http::{BoxStream, HttpClient};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("no resource registered for {0}")]
    NotFound(String),

    #[error("connection reset after {0} chunks")]
    Reset(usize),
}

/// A canned response body.
///
/// # Examples
///
/// ```
/// use depot_fetch::MemoryResource;
/// use std::time::Duration;
///
/// let slow = MemoryResource::new(vec![0u8; 4096])
///     .chunk_size(512)
///     .delay(Duration::from_millis(5));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryResource {
    body:       Bytes,
    chunk_size: usize,
    delay:      Duration,
    fail_after: Option<usize>,
}

impl MemoryResource {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body:       body.into(),
            chunk_size: 8 * 1024,
            delay:      Duration::ZERO,
            fail_after: None,
        }
    }

    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Sleep before yielding each chunk.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Yield `chunks` chunks, then fail the stream.
    #[must_use]
    pub fn fail_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }

    fn chunks(&self) -> Vec<Result<Bytes, MemoryError>> {
        let mut chunks: Vec<_> = (0..self.body.len())
            .step_by(self.chunk_size)
            .map(|start| {
                let end = (start + self.chunk_size).min(self.body.len());
                Ok(self.body.slice(start..end))
            })
            .collect();
        if let Some(limit) = self.fail_after {
            chunks.truncate(limit);
            chunks.push(Err(MemoryError::Reset(limit)));
        }
        chunks
    }
}

/// In-process [`HttpClient`] that serves registered bodies and counts how
/// often each URL was opened. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    resources: Arc<Mutex<HashMap<Url, MemoryResource>>>,
    requests:  Arc<Mutex<HashMap<Url, usize>>>,
}

impl MemoryClient {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, url: &Url, resource: MemoryResource) -> &Self {
        lock(&self.resources).insert(url.clone(), resource);
        self
    }

    /// Number of times `url` has been opened.
    pub fn requests(&self, url: &Url) -> usize { lock(&self.requests).get(url).copied().unwrap_or(0) }

    pub fn total_requests(&self) -> usize { lock(&self.requests).values().sum() }
}

impl HttpClient for MemoryClient {
    type Error = MemoryError;

    async fn open(
        &self,
        url: &Url,
    ) -> Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error> {
        *lock(&self.requests).entry(url.clone()).or_default() += 1;

        let resource = lock(&self.resources)
            .get(url)
            .cloned()
            .ok_or_else(|| MemoryError::NotFound(url.to_string()))?;

        let delay = resource.delay;
        let body = stream::iter(resource.chunks()).then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            chunk
        });
        Ok(Box::pin(body))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> { mutex.lock().unwrap_or_else(PoisonError::into_inner) }

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chunks_and_counts() {
        let client = MemoryClient::new();
        let url = Url::parse("http://mem/a").unwrap();
        client.insert(&url, MemoryResource::new(&b"abcdefg"[..]).chunk_size(3));

        let chunks: Vec<_> = client.open(&url).await.unwrap().collect().await;
        let chunks: Vec<_> = chunks.into_iter().map(Result::unwrap).collect();
        assert_eq!(chunks, vec![Bytes::from("abc"), Bytes::from("def"), Bytes::from("g")]);
        assert_eq!(client.requests(&url), 1);
    }

    #[tokio::test]
    async fn test_missing_resource() {
        let client = MemoryClient::new();
        let url = Url::parse("http://mem/missing").unwrap();
        assert!(matches!(client.open(&url).await, Err(MemoryError::NotFound(_))));
        assert_eq!(client.requests(&url), 1);
    }

    #[tokio::test]
    async fn test_fail_after() {
        let client = MemoryClient::new();
        let url = Url::parse("http://mem/flaky").unwrap();
        client.insert(&url, MemoryResource::new(vec![1u8; 10]).chunk_size(4).fail_after(1));

        let chunks: Vec<_> = client.open(&url).await.unwrap().collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], Err(MemoryError::Reset(1)));
    }
}
