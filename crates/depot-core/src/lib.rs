//! Shared vocabulary for depot.
//!
//! - [`StorageQuantity`] - byte counts on a 1024-based unit ladder, the common
//!   currency for every size comparison
//! - [`Catalog`] - the immutable registry of downloadable [`Artifact`]s, each
//!   tagged with an explicit [`Family`]

mod catalog;
mod error;
mod quantity;

pub use catalog::{Artifact, Catalog, CatalogBuilder, Family, CHECKSUM_ALGORITHM};
pub use error::{CatalogError, QuantityParseError, Result};
pub use quantity::{StorageQuantity, StorageUnit};
