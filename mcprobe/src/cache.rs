//! Short-lived per-host status cache.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::StatusSnapshot;

/// A source of wall-clock time in milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub captured_at: u64,
    pub snapshot: StatusSnapshot,
}

/// Snapshots keyed by `host:port`, fresh for `ttl` after capture.
///
/// Entries are overwritten by each completed probe cycle and never removed.
/// Admission slots only live while a cycle for their key is running or queued.
/// [`StatusCache::admit`] serialises probe cycles per key so that concurrent
/// misses on one key share a single cycle.
#[derive(Debug)]
pub struct StatusCache {
    ttl_millis: u64,
    entries: Mutex<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl StatusCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_millis: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// The snapshot stored under `key`, if it is younger than the TTL at `now`.
    pub fn get(&self, key: &str, now: u64) -> Option<StatusSnapshot> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        (now.saturating_sub(entry.captured_at) < self.ttl_millis).then(|| entry.snapshot.clone())
    }

    pub fn put(&self, key: impl Into<String>, snapshot: StatusSnapshot, now: u64) {
        self.entries.lock().insert(
            key.into(),
            CacheEntry {
                captured_at: now,
                snapshot,
            },
        );
    }

    /// Waits for the right to run a probe cycle for `key`.
    ///
    /// Holders should check [`StatusCache::get`] again once admitted: the
    /// previous holder has usually just filled the entry.
    pub async fn admit(&self, key: &str) -> Admission<'_> {
        let slot = Arc::clone(
            self.in_flight
                .lock()
                .entry(key.to_string())
                .or_default(),
        );
        Admission {
            cache: self,
            key: key.to_string(),
            guard: Some(slot.lock_owned().await),
        }
    }
}

/// Exclusive right to probe one key, released on drop.
///
/// The key's slot is removed once no other task is waiting on it.
#[derive(Debug)]
pub struct Admission<'a> {
    cache: &'a StatusCache,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut in_flight = self.cache.in_flight.lock();
        if in_flight
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            in_flight.remove(&self.key);
        }
    }
}
