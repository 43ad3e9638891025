use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use depot_core::StorageQuantity;

use crate::error::{ProbeError, Result};

pub const AVAILABLE: &str = "Available";
pub const USED: &str = "Used";
pub const SIZE: &str = "Size";

/// Named disk quantities, keyed by metric name (`Available`, `Used`, ...).
pub type Metrics = HashMap<String, StorageQuantity>;

/// A one-shot, blocking query of the filesystem containing `path`.
pub trait DiskProbe: Send + Sync + Debug {
    fn probe(&self, path: &Path) -> Result<Metrics>;
}

/// Queries the filesystem directly through `statvfs` (or the platform
/// equivalent).
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsProbe;

impl DiskProbe for StatvfsProbe {
    fn probe(&self, path: &Path) -> Result<Metrics> {
        let io_err = |source| ProbeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let available = fs2::available_space(path).map_err(io_err)?;
        let free = fs2::free_space(path).map_err(io_err)?;
        let total = fs2::total_space(path).map_err(io_err)?;

        Ok(HashMap::from([
            (AVAILABLE.to_string(), StorageQuantity::from(available)),
            (USED.to_string(), StorageQuantity::from(total.saturating_sub(free))),
            (SIZE.to_string(), StorageQuantity::from(total)),
        ]))
    }
}

/// Shells out to `df -kP` and parses its report.
#[derive(Debug, Clone, Copy, Default)]
pub struct DfProbe;

impl DiskProbe for DfProbe {
    fn probe(&self, path: &Path) -> Result<Metrics> {
        let cmd = format!("df -kP {}", path.display());
        let output = Command::new("df")
            .arg("-kP")
            .arg(path)
            .output()
            .map_err(|source| ProbeError::CommandFailed {
                cmd: cmd.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandStatus {
                cmd,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_df_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse a POSIX `df -k` report.
///
/// Header tokens are paired positionally with the tokens of the first data
/// row; pairs whose value is not an integer are skipped, and integers are
/// read as kilobytes. `Avail` is reported as `Available`.
///
/// # Examples
///
/// ```
/// use depot_core::StorageQuantity;
/// use depot_space::{AVAILABLE, parse_df_output};
///
/// let report = "Filesystem 1024-blocks Used Available Capacity Mounted on\n\
///               /dev/sda1 1000 400 600 40% /\n";
/// let metrics = parse_df_output(report).unwrap();
/// assert_eq!(metrics[AVAILABLE], StorageQuantity::kb(600));
/// ```
pub fn parse_df_output(output: &str) -> Result<Metrics> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let (Some(header), Some(values)) = (lines.next(), lines.next()) else {
        return Err(ProbeError::Parse(output.trim().to_string()));
    };

    let metrics: Metrics = header
        .split_whitespace()
        .zip(values.split_whitespace())
        .filter_map(|(name, value)| {
            let kb = value.parse::<i64>().ok()?;
            let name = if name == "Avail" { AVAILABLE } else { name };
            Some((name.to_string(), StorageQuantity::kb(kb)))
        })
        .collect();

    if !metrics.contains_key(AVAILABLE) {
        return Err(ProbeError::Parse(format!("no {AVAILABLE} column in: {header}")));
    }
    Ok(metrics)
}

/// A probe that reports a configurable amount of available space.
///
/// Clones share state, so a test can keep a handle and change the reported
/// value (or make the probe fail) while a monitor is sampling it.
#[derive(Debug, Clone)]
pub struct FixedProbe {
    available: Arc<Mutex<StorageQuantity>>,
    failing:   Arc<AtomicBool>,
    calls:     Arc<AtomicUsize>,
}

impl FixedProbe {
    pub fn new(available: StorageQuantity) -> Self {
        Self {
            available: Arc::new(Mutex::new(available)),
            failing:   Arc::new(AtomicBool::new(false)),
            calls:     Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_available(&self, available: StorageQuantity) {
        *self.available.lock().unwrap_or_else(PoisonError::into_inner) = available;
    }

    pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl DiskProbe for FixedProbe {
    fn probe(&self, _path: &Path) -> Result<Metrics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProbeError::Unavailable("fixed probe set to fail".into()));
        }
        let available = *self.available.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(HashMap::from([(AVAILABLE.to_string(), available)]))
    }
}
