//! Streaming single-writer transfers.
//!
//! # Architecture
//!
//! - [`data`] - transfer options
//! - [`effects`] - the [`HttpClient`] seam and the [`TransferEngine`] that
//!   streams a response body into an exclusively locked destination file
//!
//! The engine is mechanism-only: it never decides *whether* to download.
//! Integrity checks, eviction and retries belong to the caller.

pub mod data;
pub mod effects;
mod error;

pub use data::TransferOptions;
pub use effects::{BoxStream, HttpClient, MemoryClient, MemoryError, MemoryResource, TransferEngine};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{Result, TransferError};
