mod http;
mod memory;
mod transfer;

pub use http::{BoxStream, HttpClient};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
pub use memory::{MemoryClient, MemoryError, MemoryResource};
pub use transfer::TransferEngine;
