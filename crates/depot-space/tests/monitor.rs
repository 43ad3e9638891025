use std::sync::Arc;
use std::time::Duration;

use depot_core::StorageQuantity;
use depot_space::{FixedProbe, SpaceMonitor, StatvfsProbe};

#[tokio::test]
async fn test_failed_probe_keeps_previous_snapshot() {
    let probe = FixedProbe::new(StorageQuantity::mb(500));
    let monitor = SpaceMonitor::spawn("/", Arc::new(probe.clone()), Duration::from_millis(10));
    let first = monitor.wait_for_sample(Duration::from_secs(5)).await.unwrap();

    probe.set_failing(true);
    let calls = probe.calls();
    while probe.calls() < calls + 3 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let latest = monitor.latest().unwrap();
    assert_eq!(latest.available(), Some(StorageQuantity::mb(500)));
    assert_eq!(latest.taken_at(), first.taken_at());
    monitor.stop().await;
}

#[tokio::test]
async fn test_subscribers_see_new_samples() {
    let probe = FixedProbe::new(StorageQuantity::mb(100));
    let monitor = SpaceMonitor::spawn("/", Arc::new(probe.clone()), Duration::from_millis(10));
    monitor.wait_for_sample(Duration::from_secs(5)).await.unwrap();

    let mut rx = monitor.subscribe();
    probe.set_available(StorageQuantity::mb(42));
    let seen = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.as_ref().and_then(|s| s.available()) == Some(StorageQuantity::mb(42))),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(seen.unwrap().available(), Some(StorageQuantity::mb(42)));
    monitor.stop().await;
}

#[tokio::test]
async fn test_statvfs_monitor_on_tempdir() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = SpaceMonitor::spawn(dir.path(), Arc::new(StatvfsProbe), Duration::from_secs(10));

    let sample = monitor.wait_for_sample(Duration::from_secs(5)).await.unwrap();
    assert!(sample.available().is_some());
    assert!(sample.used().is_some());
}
