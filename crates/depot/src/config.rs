use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use depot_core::{QuantityParseError, StorageQuantity};
use depot_fetch::TransferOptions;
use depot_space::{DfProbe, DiskProbe, StatvfsProbe};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DESTINATION_ENV: &str = "DEPOT_DESTINATION";
pub const MIN_FREE_SPACE_ENV: &str = "DEPOT_MIN_FREE_SPACE";

const CLUSTER_DESTINATION: &str = "/agent";
const LOCAL_DESTINATION: &str = "/tmp/agent";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}: {source}")]
    InvalidEnv {
        var:    &'static str,
        value:  String,
        #[source]
        source: QuantityParseError,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// When the family's old versions are evicted relative to the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Keep `max_retain - 1` files before transferring, leaving headroom for
    /// the incoming one.
    #[default]
    BeforeTransfer,
    /// Keep `max_retain` files once the new file is verified. A failed
    /// transfer leaves the retained set untouched.
    AfterSuccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    #[default]
    Statvfs,
    Df,
}

impl ProbeKind {
    pub fn build(self) -> Arc<dyn DiskProbe> {
        match self {
            Self::Statvfs => Arc::new(StatvfsProbe),
            Self::Df => Arc::new(DfProbe),
        }
    }
}

/// Runtime settings for a [`Downloader`](crate::Downloader).
///
/// Every field has a default, so a TOML file only needs the keys it
/// overrides:
///
/// ```
/// use depot::{DepotConfig, EvictionPolicy, StorageQuantity};
///
/// let config = DepotConfig::from_toml_str(r#"
///     destination = "/srv/agents"
///     min_free_space = "1GB"
///     eviction = "after_success"
/// "#).unwrap();
///
/// assert_eq!(config.min_free_space, StorageQuantity::gb(1));
/// assert_eq!(config.eviction, EvictionPolicy::AfterSuccess);
/// assert_eq!(config.max_retain, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepotConfig {
    pub destination:               PathBuf,
    pub timeout_secs:              u64,
    pub min_free_space:            StorageQuantity,
    pub max_retain:                usize,
    pub buffer_size:               StorageQuantity,
    pub sample_interval_secs:      u64,
    pub sample_wait_secs:          u64,
    pub lock_attempt_timeout_secs: u64,
    pub lock_retries:              u32,
    pub concurrency:               usize,
    pub eviction:                  EvictionPolicy,
    pub probe:                     ProbeKind,
    pub verify_after_transfer:     bool,
}

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            destination:               default_destination(),
            timeout_secs:              5 * 60,
            min_free_space:            StorageQuantity::mb(245),
            max_retain:                3,
            buffer_size:               StorageQuantity::kb(8),
            sample_interval_secs:      10,
            sample_wait_secs:          60,
            lock_attempt_timeout_secs: 150,
            lock_retries:              3,
            concurrency:               4,
            eviction:                  EvictionPolicy::default(),
            probe:                     ProbeKind::default(),
            verify_after_transfer:     true,
        }
    }
}

/// `/agent` inside a Kubernetes pod, `/tmp/agent` elsewhere.
pub fn default_destination() -> PathBuf {
    if std::env::var_os("KUBERNETES_SERVICE_HOST").is_some() {
        PathBuf::from(CLUSTER_DESTINATION)
    } else {
        PathBuf::from(LOCAL_DESTINATION)
    }
}

impl DepotConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.max_retain == 0 {
            return Err(ConfigError::Invalid("max_retain must be at least 1".into()));
        }
        if self.sample_interval_secs == 0 {
            return Err(ConfigError::Invalid("sample_interval_secs must be at least 1".into()));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("destination must not be empty".into()));
        }
        Ok(())
    }

    /// Overlay `DEPOT_DESTINATION` and `DEPOT_MIN_FREE_SPACE` from the
    /// process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> { self.apply_env_from(|var| std::env::var(var).ok()) }

    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(dest) = lookup(DESTINATION_ENV).filter(|v| !v.trim().is_empty()) {
            self.destination = PathBuf::from(dest.trim());
        }
        if let Some(value) = lookup(MIN_FREE_SPACE_ENV) {
            self.min_free_space = value.parse().map_err(|source| ConfigError::InvalidEnv {
                var: MIN_FREE_SPACE_ENV,
                value,
                source,
            })?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    #[must_use]
    pub fn min_free_space(mut self, quantity: StorageQuantity) -> Self {
        self.min_free_space = quantity;
        self
    }

    #[must_use]
    pub fn max_retain(mut self, max_retain: usize) -> Self {
        self.max_retain = max_retain;
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn buffer_size(mut self, size: StorageQuantity) -> Self {
        self.buffer_size = size;
        self
    }

    #[must_use]
    pub fn sample_interval_secs(mut self, secs: u64) -> Self {
        self.sample_interval_secs = secs;
        self
    }

    #[must_use]
    pub fn sample_wait_secs(mut self, secs: u64) -> Self {
        self.sample_wait_secs = secs;
        self
    }

    #[must_use]
    pub fn lock_attempt_timeout_secs(mut self, secs: u64) -> Self {
        self.lock_attempt_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn lock_retries(mut self, retries: u32) -> Self {
        self.lock_retries = retries;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn eviction(mut self, policy: EvictionPolicy) -> Self {
        self.eviction = policy;
        self
    }

    #[must_use]
    pub fn probe(mut self, probe: ProbeKind) -> Self {
        self.probe = probe;
        self
    }

    #[must_use]
    pub fn verify_after_transfer(mut self, verify: bool) -> Self {
        self.verify_after_transfer = verify;
        self
    }

    pub fn transfer_timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

    pub fn sample_interval(&self) -> Duration { Duration::from_secs(self.sample_interval_secs) }

    pub fn sample_wait(&self) -> Duration { Duration::from_secs(self.sample_wait_secs) }

    pub fn lock_attempt_timeout(&self) -> Duration { Duration::from_secs(self.lock_attempt_timeout_secs) }

    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions::default()
            .buffer_size(self.buffer_size)
            .timeout(self.transfer_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DepotConfig::default();
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.min_free_space, StorageQuantity::mb(245));
        assert_eq!(config.max_retain, 3);
        assert_eq!(config.transfer_options().chunk_len(), 8 * 1024);
        assert_eq!(config.lock_attempt_timeout(), Duration::from_secs(150));
        assert_eq!(config.eviction, EvictionPolicy::BeforeTransfer);
        assert!(config.verify_after_transfer);
    }

    #[test]
    fn test_partial_toml() {
        let config = DepotConfig::from_toml_str(
            r#"
            destination = "/data/agents"
            buffer_size = "64KB"
            probe = "df"
            lock_retries = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.destination, PathBuf::from("/data/agents"));
        assert_eq!(config.buffer_size, StorageQuantity::kb(64));
        assert_eq!(config.probe, ProbeKind::Df);
        assert_eq!(config.lock_retries, 0);
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            DepotConfig::from_toml_str("concurrency = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DepotConfig::from_toml_str("max_retain = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DepotConfig::default().sample_interval_secs(0).validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DepotConfig::from_toml_str("min_free_space = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            DepotConfig::from_toml_str("eviction = \"never\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overlay() {
        let config = DepotConfig::default()
            .apply_env_from(|var| match var {
                DESTINATION_ENV => Some("/mnt/cache".into()),
                MIN_FREE_SPACE_ENV => Some("2GB".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.destination, PathBuf::from("/mnt/cache"));
        assert_eq!(config.min_free_space, StorageQuantity::gb(2));

        let err = DepotConfig::default()
            .apply_env_from(|var| (var == MIN_FREE_SPACE_ENV).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: MIN_FREE_SPACE_ENV, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depot.toml");
        std::fs::write(&path, "max_retain = 5\nsample_wait_secs = 2\n").unwrap();

        let config = DepotConfig::load(&path).unwrap();
        assert_eq!(config.max_retain, 5);
        assert_eq!(config.sample_wait(), Duration::from_secs(2));
        assert!(matches!(
            DepotConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
