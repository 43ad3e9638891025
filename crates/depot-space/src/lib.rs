//! Disk space sampling.
//!
//! A [`DiskProbe`] answers "how much room is there under this path" once; a
//! [`SpaceMonitor`] asks it periodically in the background and publishes the
//! latest answer as an immutable [`SpaceSample`].

mod error;
mod monitor;
mod probe;

pub use error::{ProbeError, Result, SpaceError};
pub use monitor::{SpaceMonitor, SpaceSample};
pub use probe::{AVAILABLE, DfProbe, DiskProbe, FixedProbe, Metrics, SIZE, StatvfsProbe, USED, parse_df_output};
