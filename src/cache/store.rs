//! Session-wide query cache with generation-tracked invalidation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::ops::compute::Op;
use moka::sync::Cache;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::key::{CacheKey, KeyScope};
use super::types::{CacheEntry, CacheRead, CacheValue, FetchTicket};
use crate::constants::DEFAULT_CACHE_CAPACITY;

/// Shared cache keyed by semantic query tuples.
///
/// Every invalidation advances a global generation counter. Fetches take a
/// [`FetchTicket`] stamped with the generation at which they began, so a response that
/// was in flight across an invalidation is stored but still reads as stale.
pub struct QueryCache {
    entries: Cache<CacheKey, CacheEntry>,
    generation: AtomicU64,
    scope_gens: RwLock<HashMap<KeyScope, u64>>,
}

impl QueryCache {
    /// Creates a cache with the default capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache with a max entry capacity (LRU eviction).
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            generation: AtomicU64::new(0),
            scope_gens: RwLock::new(HashMap::new()),
        }
    }

    /// Reads `key` without fetching.
    ///
    /// Returns `Missing` if nothing was stored or the stored value has another type.
    pub fn read<V: CacheValue>(&self, key: &CacheKey) -> CacheRead<V> {
        let Some(entry) = self.entries.get(key) else {
            return CacheRead::Missing;
        };
        let Some(value) = entry.value().and_then(V::from_cached) else {
            return CacheRead::Missing;
        };

        if self.is_stale(key, &entry) {
            CacheRead::Stale(value)
        } else {
            CacheRead::Fresh(value)
        }
    }

    /// Returns the stored value for `key` regardless of freshness.
    #[inline]
    pub fn peek<V: CacheValue>(&self, key: &CacheKey) -> Option<V> {
        self.read(key).into_value()
    }

    /// Registers the start of a fetch for `key`.
    #[inline]
    pub fn begin_fetch(&self, key: CacheKey) -> FetchTicket {
        FetchTicket {
            key,
            generation: self.generation.load(Ordering::SeqCst),
        }
    }

    /// Stores a fetched value and its fetch time in one write.
    ///
    /// Writes to one key are serialized; the last write wins. Invalidations recorded
    /// after `ticket` was issued are kept, so the value stays stale.
    pub fn store<V: CacheValue>(&self, ticket: FetchTicket, value: V, stale_after: Duration) {
        let FetchTicket { key, generation } = ticket;
        let cached = value.into_cached();

        self.entries
            .entry(key)
            .and_compute_with(|existing| {
                let invalidated_gen = existing
                    .map(|e| e.into_value().invalidated_gen)
                    .unwrap_or(0);
                Op::Put(CacheEntry {
                    value: Some(cached),
                    fetched_at: Some(Instant::now()),
                    stale_after,
                    fetched_gen: generation,
                    invalidated_gen,
                })
            });
    }

    /// Fetch-free write used for values the caller already holds (e.g. an update response).
    pub fn put<V: CacheValue>(&self, key: CacheKey, value: V, stale_after: Duration) {
        let ticket = self.begin_fetch(key);
        self.store(ticket, value, stale_after);
    }

    /// Marks `key` stale so the next read refetches. Idempotent.
    pub fn invalidate(&self, key: &CacheKey) {
        let generation = self.next_generation();

        self.entries
            .entry(key.clone())
            .and_compute_with(|existing| {
                let entry = match existing {
                    Some(e) => {
                        let mut entry = e.into_value();
                        entry.invalidated_gen = entry.invalidated_gen.max(generation);
                        entry
                    }
                    None => CacheEntry::tombstone(generation),
                };
                Op::Put(entry)
            });

        debug!(key = %key, generation, "cache key invalidated");
    }

    /// Drops the value stored for `key`, leaving a tombstone.
    ///
    /// The next read is `Missing`. A fetch that began before the removal stores its
    /// value as stale.
    pub fn remove(&self, key: &CacheKey) {
        let generation = self.next_generation();
        self.entries
            .insert(key.clone(), CacheEntry::tombstone(generation));

        debug!(key = %key, generation, "cache key removed");
    }

    /// Marks every key of `scope` stale, including keys stored by in-flight fetches.
    pub fn invalidate_scope(&self, scope: KeyScope) {
        let generation = self.next_generation();
        self.scope_gens.write().insert(scope, generation);

        debug!(scope = %scope, generation, "cache scope invalidated");
    }

    /// Returns `true` if a value (fresh or stale) is stored for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.value().is_some())
    }

    /// Returns the number of entries, tombstones included.
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.scope_gens.write().clear();
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_stale(&self, key: &CacheKey, entry: &CacheEntry) -> bool {
        if entry.is_invalidated() {
            return true;
        }
        let scope_gen = self
            .scope_gens
            .read()
            .get(&key.scope())
            .copied()
            .unwrap_or(0);
        if scope_gen > entry.fetched_gen {
            return true;
        }
        entry.is_expired(Instant::now())
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.entry_count())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

/// Shared handle to a [`QueryCache`].
pub type SharedCache = Arc<QueryCache>;
