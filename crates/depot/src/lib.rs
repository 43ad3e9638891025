//! Keeps a local directory populated with verified copies of catalog
//! artifacts.
//!
//! [`Downloader`] is the entry point. For each requested URL it
//!
//! 1. skips the work when a byte-identical copy is already on disk,
//! 2. serializes writers per [`Family`] and per URL,
//! 3. refuses to start when the disk is below the free-space floor,
//! 4. evicts the family's oldest versions down to the retention limit, and
//! 5. streams the artifact through [`depot_fetch::TransferEngine`].
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use depot::{Catalog, DepotConfig, Downloader, ReqwestClient};
//!
//! let config = DepotConfig::default().destination("/tmp/agent");
//! let client = ReqwestClient::new(Duration::from_secs(config.timeout_secs))?;
//! let downloader = Downloader::new(config, Arc::new(Catalog::builtin().clone()), client)?;
//!
//! let urls = downloader.catalog().urls();
//! for report in downloader.do_copy(&urls, true).await {
//!     println!("{}: {:?}", report.url, report.result);
//! }
//! downloader.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod downloader;
mod error;
pub mod integrity;
mod locks;

pub use config::{ConfigError, DepotConfig, EvictionPolicy, ProbeKind, default_destination};
pub use downloader::{DownloadReport, Downloader, Outcome, VerifyReport};
pub use error::{DownloadError, Result};
pub use integrity::{Reason, Verdict};
pub use locks::LockTable;

pub use depot_core::{Artifact, Catalog, Family, StorageQuantity, StorageUnit};
#[cfg(feature = "reqwest")]
pub use depot_fetch::ReqwestClient;
pub use depot_fetch::{HttpClient, MemoryClient, MemoryResource};
pub use depot_space::{DiskProbe, FixedProbe, SpaceMonitor, SpaceSample};
