use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use depot_core::StorageQuantity;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SpaceError;
use crate::probe::{AVAILABLE, DiskProbe, Metrics, USED};

/// One immutable probe result.
#[derive(Debug, Clone)]
pub struct SpaceSample {
    metrics:  Metrics,
    taken_at: Instant,
}

impl SpaceSample {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            taken_at: Instant::now(),
        }
    }

    pub fn metrics(&self) -> &Metrics { &self.metrics }

    pub fn taken_at(&self) -> Instant { self.taken_at }

    pub fn get(&self, name: &str) -> Option<StorageQuantity> { self.metrics.get(name).copied() }

    pub fn available(&self) -> Option<StorageQuantity> { self.get(AVAILABLE) }

    pub fn used(&self) -> Option<StorageQuantity> { self.get(USED) }
}

type Snapshot = Option<Arc<SpaceSample>>;

/// Background sampler of the disk holding a destination directory.
///
/// The first sample is taken as soon as the task starts, then one per
/// interval. Readers never block the sampler: they clone the current
/// snapshot out of a `watch` channel. A failed probe keeps the previous
/// snapshot. Dropping the monitor cancels the task.
#[derive(Debug)]
pub struct SpaceMonitor {
    path:   PathBuf,
    rx:     watch::Receiver<Snapshot>,
    cancel: CancellationToken,
    task:   Option<JoinHandle<()>>,
}

impl SpaceMonitor {
    /// Start sampling. Must be called from within a tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>, probe: Arc<dyn DiskProbe>, interval: Duration) -> Self {
        let path = path.into();
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(sample_loop(
            path.clone(),
            probe,
            interval.max(Duration::from_millis(1)),
            tx,
            cancel.clone(),
        ));

        Self {
            path,
            rx,
            cancel,
            task: Some(task),
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// The most recent sample, if any has been taken yet.
    pub fn latest(&self) -> Option<Arc<SpaceSample>> { self.rx.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<SpaceSample>>> { self.rx.clone() }

    /// Wait at most `max_wait` for the first sample.
    pub async fn wait_for_sample(&self, max_wait: Duration) -> Result<Arc<SpaceSample>, SpaceError> {
        if let Some(sample) = self.latest() {
            return Ok(sample);
        }
        let mut rx = self.rx.clone();
        match tokio::time::timeout(max_wait, rx.wait_for(Option::is_some)).await {
            Ok(Ok(snapshot)) => snapshot.clone().ok_or(SpaceError::Stopped),
            Ok(Err(_)) => Err(SpaceError::Stopped),
            Err(_) => Err(SpaceError::NoSample { waited: max_wait }),
        }
    }

    pub fn is_running(&self) -> bool { self.task.as_ref().is_some_and(|t| !t.is_finished()) }

    /// Cancel the sampler and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(e) = task.await {
            warn!(error = %e, "space monitor task failed");
        }
    }
}

impl Drop for SpaceMonitor {
    fn drop(&mut self) { self.cancel.cancel(); }
}

async fn sample_loop(
    path: PathBuf,
    probe: Arc<dyn DiskProbe>,
    interval: Duration,
    tx: watch::Sender<Snapshot>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let probe = Arc::clone(&probe);
        let target = path.clone();
        match tokio::task::spawn_blocking(move || probe.probe(&target)).await {
            Ok(Ok(metrics)) => {
                let sample = SpaceSample::new(metrics);
                debug!(
                    path = %path.display(),
                    available = ?sample.available(),
                    used = ?sample.used(),
                    "disk space sampled"
                );
                tx.send_replace(Some(Arc::new(sample)));
            }
            Ok(Err(e)) => warn!(path = %path.display(), error = %e, "disk probe failed; keeping previous sample"),
            Err(e) => warn!(path = %path.display(), error = %e, "disk probe task failed"),
        }
    }
    debug!(path = %path.display(), "space monitor stopped");
}
