//! Per-key mutual exclusion for cache recomputation.
//!
//! The registry maps a cache key to a lock plus a holder count. A holder is
//! any task that has registered for the key, whether it is still waiting or
//! already inside. Increments happen under the registry shard lock in the
//! get-or-create step and removal re-checks the count under the same shard
//! lock, so an entry is only dropped at a true transition to zero and never
//! while a new waiter is using it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

struct KeyLock {
    mutex: Arc<Mutex<()>>,
    holders: AtomicUsize,
}

type Registry = DashMap<String, Arc<KeyLock>>;

/// Process-wide registry of per-key recompute locks.
///
/// Construct one for the lifetime of the process and hand clones to every
/// executor; clones share the registry. Exclusion is local to this process.
#[derive(Clone, Default)]
pub struct StampedeGuard {
    locks: Arc<Registry>,
}

impl StampedeGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the exclusive right to recompute `key`.
    ///
    /// Suspends the calling task, never the thread. There is no timeout.
    /// Dropping the returned future while it waits gives up the place in the
    /// queue and releases the registration.
    pub async fn acquire(&self, key: &str) -> GuardHandle {
        let registration = self.register(key);
        let permit = registration.lock.mutex.clone().lock_owned().await;
        trace!(key = %key, "recompute lock acquired");
        GuardHandle {
            _permit: permit,
            registration,
        }
    }

    fn register(&self, key: &str) -> Registration {
        let lock = match self.locks.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                let lock = occupied.get().clone();
                lock.holders.fetch_add(1, Ordering::AcqRel);
                lock
            }
            Entry::Vacant(vacant) => {
                let lock = Arc::new(KeyLock {
                    mutex: Arc::new(Mutex::new(())),
                    holders: AtomicUsize::new(1),
                });
                vacant.insert(lock.clone());
                lock
            }
        };

        Registration {
            key: key.to_string(),
            lock,
            locks: self.locks.clone(),
        }
    }

    /// Number of keys that currently have a registered lock
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Tasks holding or waiting for `key`
    pub fn holders(&self, key: &str) -> usize {
        self.locks
            .get(key)
            .map(|lock| lock.holders.load(Ordering::Acquire))
            .unwrap_or(0)
    }
}

struct Registration {
    key: String,
    lock: Arc<KeyLock>,
    locks: Arc<Registry>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.lock.holders.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }

        let removed = self.locks.remove_if(&self.key, |_, current| {
            Arc::ptr_eq(current, &self.lock) && current.holders.load(Ordering::Acquire) == 0
        });

        if removed.is_none() {
            // A new waiter registered after our decrement; the slot stays with it.
            trace!(key = %self.key, "lock entry retained by a newer holder");
        }
    }
}

/// Exclusive right to recompute one key.
///
/// Released exactly once, when dropped, on every exit path.
pub struct GuardHandle {
    // Field order matters: the mutex is unlocked before the registration is
    // dropped, so a zero holder count always means nobody is inside.
    _permit: OwnedMutexGuard<()>,
    registration: Registration,
}

impl GuardHandle {
    /// The key this handle protects
    pub fn key(&self) -> &str {
        &self.registration.key
    }

    /// Release the lock. Equivalent to dropping the handle.
    pub fn release(self) {
        drop(self);
    }
}

impl std::fmt::Debug for GuardHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardHandle").field("key", &self.key()).finish()
    }
}
