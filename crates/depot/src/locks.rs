use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Keyed async mutexes, created on first use and kept for the life of the
/// table.
///
/// The table's own map is guarded by a short-lived synchronous mutex that is
/// never held across an await; waiting happens on the per-key async mutex.
pub struct LockTable<K> {
    entries: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Clone> LockTable<K> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The mutex for `key`. Every call with an equal key returns the same one.
    pub fn handle(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key.clone()).or_default())
    }

    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> { self.handle(key).lock_owned().await }

    /// Wait at most `timeout` for `key`.
    pub async fn lock_timeout(&self, key: &K, timeout: Duration) -> Option<OwnedMutexGuard<()>> {
        tokio::time::timeout(timeout, self.lock(key)).await.ok()
    }

    pub fn len(&self) -> usize { self.entries.lock().unwrap_or_else(PoisonError::into_inner).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<K: Eq + Hash + Clone> Default for LockTable<K> {
    fn default() -> Self { Self::new() }
}

impl<K> fmt::Debug for LockTable<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.entries.lock().map(|e| e.len()).unwrap_or_default();
        f.debug_struct("LockTable").field("keys", &len).finish()
    }
}
