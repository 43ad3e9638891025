use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use depot::DepotConfig;

/// Defaults, then the config file, then the environment, then `--destination`.
pub fn resolve(config: Option<&Path>, destination: Option<PathBuf>) -> Result<DepotConfig> {
    let base = match config {
        Some(path) => DepotConfig::load(path).with_context(|| format!("failed to load {}", path.display()))?,
        None => DepotConfig::default(),
    };
    let resolved = base.apply_env().context("invalid environment override")?;

    Ok(match destination {
        Some(dir) => resolved.destination(dir),
        None => resolved,
    })
}
