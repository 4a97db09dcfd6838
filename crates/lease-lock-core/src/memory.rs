//! Process-local [`LeaseStore`].
//!
//! Useful for tests and for coordinating tasks inside one process. Expiry is
//! measured with [`tokio::time::Instant`], so a paused tokio clock controls
//! it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{LockError, LockResult};
use crate::store::LeaseStore;

/// Stand-in expiry for TTLs too large to add to an instant.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

fn expiry_at(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl).unwrap_or(now + FAR_FUTURE)
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory lease store with store-side atomicity provided by a mutex.
#[derive(Debug, Default)]
pub struct MemoryLeaseStore {
    entries: Mutex<HashMap<String, Entry>>,
    operations: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations issued so far.
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Makes every subsequent operation fail as if the store were
    /// unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Remaining time-to-live of `key`, if it holds a live lease.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.with_entries(|entries| {
            entries
                .get(key)
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.expires_at - now)
        })
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, Entry>) -> T) -> T {
        // Entries are replaced whole, so a poisoned map is still consistent.
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_live(now));
        f(&mut entries)
    }

    fn begin(&self) -> LockResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LockError::unavailable("memory store marked unavailable"));
        }
        Ok(())
    }
}

impl LeaseStore for MemoryLeaseStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        self.begin()?;
        let now = Instant::now();
        Ok(self.with_entries(|entries| {
            if entries.contains_key(key) {
                return false;
            }
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: expiry_at(now, ttl),
                },
            );
            true
        }))
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> LockResult<bool> {
        self.begin()?;
        Ok(self.with_entries(|entries| {
            if entries.get(key).is_some_and(|entry| entry.value == expected) {
                entries.remove(key);
                true
            } else {
                false
            }
        }))
    }

    async fn compare_and_expire(&self, key: &str, expected: &str, ttl: Duration) -> LockResult<bool> {
        self.begin()?;
        let now = Instant::now();
        Ok(self.with_entries(|entries| match entries.get_mut(key) {
            Some(entry) if entry.value == expected => {
                entry.expires_at = expiry_at(now, ttl);
                true
            }
            _ => false,
        }))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> LockResult<bool> {
        self.begin()?;
        let now = Instant::now();
        Ok(self.with_entries(|entries| match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = expiry_at(now, ttl);
                true
            }
            None => false,
        }))
    }

    async fn owner(&self, key: &str) -> LockResult<Option<String>> {
        self.begin()?;
        Ok(self.with_entries(|entries| entries.get(key).map(|entry| entry.value.clone())))
    }
}
