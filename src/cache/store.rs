//! TTL Store Module
//!
//! Main store engine combining a value table with a table of scheduled
//! removals. Expiration is enforced twice: a removal task per expiring key
//! reclaims memory promptly, and every read re-checks the entry's age against
//! the monotonic clock so that an expired entry is never returned even if its
//! removal has not run yet.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::cache::timer::ScheduledRemoval;
use crate::cache::ttl::{normalize_ttl, RawTtl, Ttl};
use crate::cache::Entry;

// == Tables ==
/// Value and timer tables. Always mutated together under one lock.
struct Tables<K, V> {
    entries: HashMap<K, Entry<V>>,
    timers: HashMap<K, ScheduledRemoval>,
    last_generation: u64,
}

impl<K, V> Tables<K, V>
where
    K: Eq + Hash,
{
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            timers: HashMap::new(),
            last_generation: 0,
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.last_generation = self.last_generation.wrapping_add(1);
        self.last_generation
    }

    fn cancel_timer<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(timer) = self.timers.remove(key) {
            timer.cancel();
        }
    }

    /// Removes an entry and its timer. Returns whether an entry was present.
    fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cancel_timer(key);
        self.entries.remove(key).is_some()
    }

    /// Returns the entry if it is still live, purging it otherwise.
    fn live<Q>(&mut self, key: &Q, now: Instant) -> Option<&Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.entries.get(key)?.is_expired_at(now) {
            self.remove(key);
            return None;
        }
        self.entries.get(key)
    }

    /// Purges every entry whose TTL has elapsed as of `now`.
    fn sweep(&mut self, now: Instant)
    where
        K: Clone,
    {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired {
            self.remove(&key);
        }
    }

    /// Runs when a scheduled removal fires. Only touches state that belongs
    /// to the `set` which armed the removal.
    fn expire_scheduled(&mut self, key: &K, generation: u64) {
        if self
            .timers
            .get(key)
            .is_some_and(|timer| timer.generation() == generation)
        {
            self.timers.remove(key);
        }
        if self
            .entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
        {
            self.entries.remove(key);
        }
    }

    fn clear(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.cancel();
        }
        self.entries.clear();
    }
}

impl<K, V> Drop for Tables<K, V> {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.cancel();
        }
    }
}

// == TTL Store ==
/// Process-local key/value store with per-entry time-to-live.
///
/// Cloning a `TtlStore` yields another handle to the same tables. All
/// operations are synchronous; they take a short internal lock and never
/// await.
///
/// Values are handed out by clone. Store an `Arc<T>` to share large payloads
/// by reference instead.
///
/// # Expiration
/// An entry set with TTL `t` is visible while less than `t` has elapsed since
/// its most recent `set`, and invisible from then on. Removal tasks run on the
/// tokio runtime that was current when the store was created (or the one
/// passed to [`TtlStore::with_runtime`]). Without a runtime no removals are
/// scheduled and expired entries are purged when next observed.
pub struct TtlStore<K, V> {
    shared: Arc<Mutex<Tables<K, V>>>,
    runtime: Option<Handle>,
}

impl<K, V> TtlStore<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates an empty store bound to the current tokio runtime, if any.
    ///
    /// The runtime must have its time driver enabled (`enable_time` or
    /// `enable_all`). On a runtime without one, every removal task panics
    /// when first polled and tokio reports the panic. Reads still hide
    /// expired entries, but memory is only reclaimed when they are observed.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Tables::new())),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Creates an empty store whose removals run on `runtime`.
    ///
    /// `runtime` needs its time driver enabled, as for [`TtlStore::new`].
    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Tables::new())),
            runtime: Some(runtime),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, fully replacing any previous entry.
    ///
    /// `ttl` is in milliseconds and accepts numbers, numeric strings, `None`
    /// or `()`. Absent, null and non-numeric TTLs store a permanent entry.
    /// A negative TTL stores nothing and removes whatever was under `key`.
    /// Any removal scheduled by an earlier `set` of this key is cancelled.
    ///
    /// Returns the store so calls can be chained.
    pub fn set(&self, key: K, value: V, ttl: impl Into<RawTtl>) -> &Self {
        let ttl = match normalize_ttl(&ttl.into()) {
            None => None,
            Some(Ttl::Expires(duration)) => Some(duration),
            Some(Ttl::Negative) => {
                self.shared.lock().remove(&key);
                return self;
            }
        };

        let mut tables = self.shared.lock();
        tables.cancel_timer(&key);

        let generation = tables.next_generation();
        if let (Some(delay), Some(runtime)) = (ttl, &self.runtime) {
            let removal = self.schedule_removal(runtime, key.clone(), delay, generation);
            tables.timers.insert(key.clone(), removal);
        }
        tables
            .entries
            .insert(key, Entry::new(value, ttl, generation));

        self
    }

    fn schedule_removal(
        &self,
        runtime: &Handle,
        key: K,
        delay: Duration,
        generation: u64,
    ) -> ScheduledRemoval {
        let shared = Arc::downgrade(&self.shared);
        ScheduledRemoval::spawn(runtime, delay, generation, move || {
            if let Some(shared) = shared.upgrade() {
                shared.lock().expire_scheduled(&key, generation);
            }
        })
    }

    // == Get ==
    /// Returns the value under `key`, or `None` if missing or expired.
    ///
    /// An expired entry found here is deleted on the spot.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut tables = self.shared.lock();
        tables
            .live(key, Instant::now())
            .map(|entry| entry.value.clone())
    }

    // == Has ==
    /// Returns true if `key` holds a live entry. Applies the same expiry
    /// check as [`TtlStore::get`].
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut tables = self.shared.lock();
        tables.live(key, Instant::now()).is_some()
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present.
    ///
    /// An entry whose TTL elapsed but which has not been purged yet still
    /// counts as present here.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.lock().remove(key)
    }

    // == Clear ==
    /// Cancels every scheduled removal and empties the store.
    pub fn clear(&self) {
        self.shared.lock().clear();
    }

    // == Size ==
    /// Returns the number of live entries.
    ///
    /// Expired entries are purged first, so the count is exact.
    pub fn size(&self) -> usize {
        let mut tables = self.shared.lock();
        tables.sweep(Instant::now());
        tables.entries.len()
    }

    // == Keys ==
    /// Returns a snapshot of the live keys, in no particular order.
    ///
    /// Expired entries are purged first.
    pub fn keys(&self) -> Vec<K> {
        let mut tables = self.shared.lock();
        tables.sweep(Instant::now());
        tables.entries.keys().cloned().collect()
    }

    // == Time To Live ==
    /// Returns the remaining lifetime of `key`.
    ///
    /// # Returns
    /// - `None` if the key is missing or expired
    /// - `Some(None)` if the entry never expires
    /// - `Some(Some(remaining))` otherwise
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let mut tables = self.shared.lock();
        tables.live(key, now).map(|entry| entry.remaining_at(now))
    }

    /// Number of entries physically held, expired or not.
    #[cfg(test)]
    fn stored_len(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Number of outstanding scheduled removals.
    #[cfg(test)]
    fn pending_removals(&self) -> usize {
        self.shared.lock().timers.len()
    }
}

impl<K, V> Default for TtlStore<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for TtlStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            runtime: self.runtime.clone(),
        }
    }
}

impl<K, V> fmt::Debug for TtlStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.shared.lock();
        f.debug_struct("TtlStore")
            .field("entries", &tables.entries.len())
            .field("pending_removals", &tables.timers.len())
            .finish()
    }
}
