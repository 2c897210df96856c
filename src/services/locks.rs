use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Prune idle entries once the map grows past this many keys
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per key, created on demand.
///
/// Used as a single-writer gate: every read-modify-write of a user record
/// runs under that user's lock, and catalog walks for a series run under that
/// series' lock.
#[derive(Clone, Debug, Default)]
pub struct KeyedLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`; released when the guard drops
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        if self.inner.len() >= PRUNE_THRESHOLD {
            // Only the map itself holds idle entries
            self.inner.retain(|_, m| Arc::strong_count(m) > 1);
        }
        let mutex = self.inner.entry(key.to_string()).or_default().clone();
        mutex.lock_owned().await
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
