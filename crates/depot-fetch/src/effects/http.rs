use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use url::Url;

/// A boxed stream type for response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Asynchronous source of response bodies.
///
/// Implementations own their redirect handling and connection-level
/// timeouts, and must surface non-success statuses as errors rather than
/// streaming an error page.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production client backed by `reqwest`
/// - [`MemoryClient`](super::MemoryClient): in-process bodies for tests
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open `url` and return its body as a stream of chunks.
    fn open(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use super::*;

    /// Production client. Connect and read timeouts are applied per
    /// connection; the overall transfer deadline is enforced by the engine.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
            Self::with_timeouts(timeout, timeout)
        }

        pub fn with_timeouts(connect: Duration, read: Duration) -> Result<Self, reqwest::Error> {
            let client = reqwest::Client::builder()
                .connect_timeout(connect)
                .read_timeout(read)
                .user_agent(concat!("depot/", env!("CARGO_PKG_VERSION")))
                .build()?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn open(
            &self,
            url: &Url,
        ) -> Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error> {
            let response = self.client.get(url.clone()).send().await?.error_for_status()?;
            Ok(Box::pin(response.bytes_stream()))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
