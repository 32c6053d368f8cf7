//! # In-Memory Counter Store
//!
//! Process-local counters behind a single `parking_lot::Mutex`. Expiry is
//! measured with an injected [`Clock`]; expired entries read as absent and
//! are dropped lazily or by [`MemoryCounterStore::purge_expired`].
//!
//! Counters are not shared between processes. Multi-instance deployments
//! use the Redis adapter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use keygate_core::{Clock, StoreError, SystemClock, WindowHit, WindowPolicy, WindowStep};
use parking_lot::Mutex;

use crate::counter::{CounterStore, DEFAULT_KEY_PREFIX};

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }

    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

/// In-memory [`CounterStore`].
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    prefix: String,
}

impl MemoryCounterStore {
    /// Store on the system clock with the default key prefix.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Store reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Replace the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of stored entries, live or not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn store_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    fn live(&self, entries: &HashMap<String, Entry>, key: &str, now: Instant) -> Option<Entry> {
        entries.get(key).copied().filter(|e| e.is_live(now))
    }
}

// Keys embed raw tokens; print only the entry count.
impl std::fmt::Debug for MemoryCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCounterStore")
            .field("entries", &self.len())
            .field("clock", &self.clock)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let key = self.store_key(key);
        let now = self.clock.now();
        let entries = self.entries.lock();
        Ok(self.live(&entries, &key, now).map(|e| e.count))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: u64,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = self.store_key(key);
        let now = self.clock.now();
        self.entries.lock().insert(
            key,
            Entry {
                count: value,
                expires_at: Some(now + ttl),
            },
        );
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let key = self.store_key(key);
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let entry = entries.entry(key).or_insert(Entry {
            count: 0,
            expires_at: None,
        });
        if !entry.is_live(now) {
            *entry = Entry {
                count: 0,
                expires_at: None,
            };
        }
        entry.count = entry.count.saturating_add(1);
        Ok(entry.count)
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let key = self.store_key(key);
        let now = self.clock.now();
        let entries = self.entries.lock();
        Ok(self.live(&entries, &key, now).and_then(|e| e.remaining(now)))
    }

    async fn hit(&self, key: &str, policy: &WindowPolicy) -> Result<WindowHit, StoreError> {
        let key = self.store_key(key);
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let live = self.live(&entries, &key, now);

        match policy.step(live.map(|e| e.count)) {
            WindowStep::Create => {
                entries.insert(
                    key,
                    Entry {
                        count: 0,
                        expires_at: Some(now + policy.window()),
                    },
                );
                Ok(WindowHit::Created {
                    ttl: policy.window(),
                })
            }
            WindowStep::Reject => {
                let entry = live.ok_or_else(vanished)?;
                Ok(WindowHit::Exhausted {
                    count: entry.count,
                    retry_after: entry.remaining(now),
                })
            }
            WindowStep::Increment => {
                let entry = entries.get_mut(&key).ok_or_else(vanished)?;
                entry.count = entry.count.saturating_add(1);
                Ok(WindowHit::Counted {
                    count: entry.count,
                    ttl: entry.remaining(now),
                })
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// Only reachable if the step function disagrees with the lookup it was fed.
fn vanished() -> StoreError {
    StoreError::Unavailable("counter entry vanished inside the critical section".into())
}
