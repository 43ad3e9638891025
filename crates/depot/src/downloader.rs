use std::path::{Path, PathBuf};
use std::sync::Arc;

use depot_core::{Artifact, Catalog, Family, StorageQuantity};
use depot_fetch::{HttpClient, TransferEngine};
use depot_space::{DiskProbe, SpaceMonitor};
use futures_util::{StreamExt, stream};
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{DepotConfig, EvictionPolicy};
use crate::error::{DownloadError, Result};
use crate::integrity::{self, Reason, Verdict};
use crate::locks::LockTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An intact copy was already on disk; nothing was transferred.
    Skipped,
    Downloaded { bytes: u64, evicted: usize },
}

/// Result of one URL in a batch.
#[derive(Debug)]
pub struct DownloadReport {
    pub url:    Url,
    pub result: Result<Outcome>,
}

impl DownloadReport {
    pub fn is_ok(&self) -> bool { self.result.is_ok() }
}

#[derive(Debug)]
pub struct VerifyReport {
    pub url:     Url,
    pub path:    PathBuf,
    pub verdict: Result<Verdict>,
}

/// Coordinates downloads of catalog artifacts into one destination directory.
///
/// Writers are serialized per family (coarse) and per URL (fine), so a
/// family's eviction never races one of its own transfers, while different
/// families proceed in parallel. Locks are taken coarse first and released
/// fine first on every path.
///
/// Construction validates the config, creates the destination and starts a
/// background [`SpaceMonitor`], so it must happen inside a tokio runtime.
#[derive(Debug)]
pub struct Downloader<C> {
    config:   DepotConfig,
    catalog:  Arc<Catalog>,
    engine:   TransferEngine<C>,
    families: LockTable<Family>,
    files:    LockTable<Url>,
    monitor:  SpaceMonitor,
    cancel:   CancellationToken,
}

impl<C: HttpClient> Downloader<C> {
    /// Build a downloader that samples disk space with the configured probe.
    pub fn new(config: DepotConfig, catalog: Arc<Catalog>, client: C) -> Result<Self> {
        let probe = config.probe.build();
        Self::with_probe(config, catalog, client, probe)
    }

    pub fn with_probe(
        config: DepotConfig,
        catalog: Arc<Catalog>,
        client: C,
        probe: Arc<dyn DiskProbe>,
    ) -> Result<Self> {
        config.validate()?;
        // The probe samples the destination itself, so it has to exist first.
        depot_fs::ensure_dir(&config.destination).map_err(|e| fs_error(&config.destination, e))?;

        let monitor = SpaceMonitor::spawn(config.destination.clone(), probe, config.sample_interval());
        Ok(Self {
            config,
            catalog,
            engine: TransferEngine::new(client),
            families: LockTable::new(),
            files: LockTable::new(),
            monitor,
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &DepotConfig { &self.config }

    pub fn catalog(&self) -> &Catalog { &self.catalog }

    pub fn destination(&self) -> &Path { &self.config.destination }

    pub fn space(&self) -> &SpaceMonitor { &self.monitor }

    pub fn client(&self) -> &C { self.engine.client() }

    /// Make sure an intact copy of `url` is on disk.
    pub async fn download(&self, url: &Url) -> Result<Outcome> {
        let artifact = self.catalog.lookup(url)?.clone();
        let family = artifact.family().clone();
        debug!(url = %url, family = %family, state = "checking_integrity");

        if self.check(&artifact).await?.is_skip() {
            info!(url = %url, family = %family, "already present; skipping");
            return Ok(Outcome::Skipped);
        }

        debug!(url = %url, family = %family, state = "awaiting_lock");
        let _family_guard = self.families.lock(&family).await;
        let _file_guard = self.lock_file(url).await?;

        // Another writer may have finished it while we waited.
        if self.check(&artifact).await?.is_skip() {
            info!(url = %url, family = %family, "completed by another writer; skipping");
            return Ok(Outcome::Skipped);
        }

        debug!(url = %url, family = %family, state = "checking_space");
        let sample = self.monitor.wait_for_sample(self.config.sample_wait()).await?;
        let available = sample.available().unwrap_or(StorageQuantity::ZERO);
        if available < self.config.min_free_space {
            warn!(
                url = %url,
                available = %available,
                required = %self.config.min_free_space,
                "not enough free space; skipping transfer"
            );
            return Err(DownloadError::InsufficientSpace {
                available,
                required: self.config.min_free_space,
            });
        }

        let mut evicted = 0;
        if self.config.eviction == EvictionPolicy::BeforeTransfer {
            evicted += self.evict(&family, self.config.max_retain.saturating_sub(1)).await?;
        }

        debug!(url = %url, family = %family, state = "transferring");
        let path = artifact.local_path(&self.config.destination);
        let bytes = self
            .engine
            .copy(url, &path, &self.config.transfer_options(), &self.cancel)
            .await?;

        if self.config.verify_after_transfer {
            if let Verdict::NeedsDownload(reason) = self.check(&artifact).await? {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "failed to remove corrupt download");
                }
                return Err(mismatch(&artifact, reason));
            }
        }

        if self.config.eviction == EvictionPolicy::AfterSuccess {
            evicted += self.evict(&family, self.config.max_retain).await?;
        }

        info!(url = %url, family = %family, bytes, evicted, "download complete");
        Ok(Outcome::Downloaded { bytes, evicted })
    }

    /// Download every URL, one report per input in input order. With
    /// `parallel`, up to `concurrency` downloads run at once.
    pub async fn do_copy(&self, urls: &[Url], parallel: bool) -> Vec<DownloadReport> {
        let width = if parallel { self.config.concurrency.max(1) } else { 1 };
        stream::iter(urls)
            .map(|url| async move {
                let result = self.download(url).await;
                if let Err(e) = &result {
                    error!(url = %url, error = %e, "download failed");
                }
                DownloadReport {
                    url: url.clone(),
                    result,
                }
            })
            .buffered(width)
            .collect()
            .await
    }

    /// Integrity verdict for every catalog artifact.
    pub async fn verify_all(&self) -> Vec<VerifyReport> {
        let mut reports = Vec::with_capacity(self.catalog.len());
        for artifact in self.catalog.all() {
            reports.push(VerifyReport {
                url:     artifact.source().clone(),
                path:    artifact.local_path(&self.config.destination),
                verdict: self.check(artifact).await,
            });
        }
        reports
    }

    /// Remove everything under the destination, keeping the directory.
    pub async fn purge(&self) -> Result<usize> {
        let destination = self.config.destination.clone();
        let removed = tokio::task::spawn_blocking(move || depot_fs::purge_dir(&destination))
            .await?
            .map_err(|e| fs_error(&self.config.destination, e))?;
        info!(destination = %self.config.destination.display(), removed, "destination purged");
        Ok(removed)
    }

    /// Ask in-flight transfers to stop at their next iteration.
    pub fn cancel(&self) { self.cancel.cancel(); }

    pub fn cancellation_token(&self) -> CancellationToken { self.cancel.clone() }

    /// Stop the space monitor.
    pub async fn shutdown(self) { self.monitor.stop().await; }

    async fn lock_file(&self, url: &Url) -> Result<OwnedMutexGuard<()>> {
        let attempts = self.config.lock_retries.saturating_add(1);
        let timeout = self.config.lock_attempt_timeout();

        for attempt in 1..=attempts {
            if let Some(guard) = self.files.lock_timeout(url, timeout).await {
                return Ok(guard);
            }
            if attempt < attempts {
                warn!(url = %url, attempt, "timed out waiting for file lock; retrying");
            }
        }
        error!(url = %url, attempts, "file lock unavailable");
        Err(DownloadError::LockUnavailable {
            url: url.clone(),
            attempts,
        })
    }

    async fn check(&self, artifact: &Artifact) -> Result<Verdict> {
        let destination = self.config.destination.clone();
        let artifact = artifact.clone();
        let path = artifact.local_path(&destination);
        tokio::task::spawn_blocking(move || integrity::check(&destination, &artifact))
            .await?
            .map_err(|source| DownloadError::Io { path, source })
    }

    async fn evict(&self, family: &Family, keep: usize) -> Result<usize> {
        let destination = self.config.destination.clone();
        let family = family.clone();
        Ok(tokio::task::spawn_blocking(move || {
            depot_fs::retain_newest(&destination, family.as_str(), keep)
        })
        .await?)
    }
}

fn mismatch(artifact: &Artifact, reason: Reason) -> DownloadError {
    let url = artifact.source();
    match reason {
        Reason::Missing => DownloadError::LengthMismatch {
            url:      url.clone(),
            expected: u64::try_from(artifact.expected_size().as_bytes()).unwrap_or(0),
            actual:   0,
        },
        Reason::LengthMismatch { expected, actual } => DownloadError::LengthMismatch {
            url: url.clone(),
            expected,
            actual,
        },
        Reason::ChecksumMismatch { expected, actual } => DownloadError::ChecksumMismatch {
            url: url.clone(),
            expected,
            actual,
        },
    }
}

fn fs_error(path: &Path, e: depot_fs::Error) -> DownloadError {
    DownloadError::Io {
        path:   path.to_path_buf(),
        source: std::io::Error::other(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use depot_fetch::{MemoryClient, MemoryResource};
    use depot_space::FixedProbe;
    use depot_verify::Sha256Hasher;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_lock_unavailable_after_retries() {
        let dir = tempdir().unwrap();
        let body = b"agent".to_vec();
        let catalog = Catalog::builder("http://mirror.test/")
            .unwrap()
            .entry(Family::DEM_AGENT, "1.0/agent.tar", 5, &Sha256Hasher::hex_digest(&body))
            .unwrap()
            .build();
        let url = catalog.urls()[0].clone();
        let client = MemoryClient::new();
        client.insert(&url, MemoryResource::new(body));

        let config = DepotConfig::default()
            .destination(dir.path())
            .lock_attempt_timeout_secs(1)
            .lock_retries(1);
        let downloader = Downloader::with_probe(
            config,
            Arc::new(catalog),
            client.clone(),
            Arc::new(FixedProbe::new(StorageQuantity::gb(10))),
        )
        .unwrap();

        let held = downloader.files.lock(&url).await;
        let err = downloader.download(&url).await.unwrap_err();
        assert!(matches!(err, DownloadError::LockUnavailable { attempts: 2, .. }));
        assert_eq!(client.requests(&url), 0);

        drop(held);
        assert!(matches!(
            downloader.download(&url).await.unwrap(),
            Outcome::Downloaded { bytes: 5, .. }
        ));
    }

    #[test]
    fn test_mismatch_mapping() {
        let catalog = Catalog::builder("http://mirror.test/")
            .unwrap()
            .entry(Family::DEM_AGENT, "1.0/agent.tar", 42, &Sha256Hasher::hex_digest(b"x"))
            .unwrap()
            .build();
        let artifact = catalog.all().next().unwrap();

        assert!(matches!(
            mismatch(artifact, Reason::LengthMismatch { expected: 3, actual: 1 }),
            DownloadError::LengthMismatch { expected: 3, actual: 1, .. }
        ));
        assert!(matches!(
            mismatch(artifact, Reason::ChecksumMismatch { expected: "a".into(), actual: "b".into() }),
            DownloadError::ChecksumMismatch { .. }
        ));
        assert!(matches!(
            mismatch(artifact, Reason::Missing),
            DownloadError::LengthMismatch { expected: 42, actual: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_creates_missing_destination() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("not/yet/created");
        let config = DepotConfig::default().destination(&destination);

        let downloader = Downloader::with_probe(
            config,
            Arc::new(Catalog::builtin().clone()),
            MemoryClient::new(),
            Arc::new(FixedProbe::new(StorageQuantity::gb(1))),
        )
        .unwrap();
        assert!(destination.is_dir());
        downloader.shutdown().await;
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let build = |config: DepotConfig| {
            Downloader::with_probe(
                config.destination(dir.path()),
                Arc::new(Catalog::builtin().clone()),
                MemoryClient::new(),
                Arc::new(FixedProbe::new(StorageQuantity::gb(1))),
            )
        };

        for config in [
            DepotConfig::default().sample_interval_secs(0),
            DepotConfig::default().concurrency(0),
            DepotConfig::default().max_retain(0),
        ] {
            assert!(matches!(build(config), Err(DownloadError::Config(ConfigError::Invalid(_)))));
        }
    }
}
