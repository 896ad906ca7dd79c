use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::key::CacheKey;
use crate::api::{JobProgress, MemoRecord, SearchResult};

/// Value stored in the session cache.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Results(Arc<Vec<SearchResult>>),
    Progress(JobProgress),
    Memo(Arc<MemoRecord>),
    /// Category or tag names.
    Names(Arc<Vec<String>>),
}

/// Conversion between a typed value and [`CachedValue`].
pub trait CacheValue: Clone + Sized {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: &CachedValue) -> Option<Self>;
}

impl CacheValue for Arc<Vec<SearchResult>> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Results(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Results(results) => Some(Arc::clone(results)),
            _ => None,
        }
    }
}

impl CacheValue for JobProgress {
    fn into_cached(self) -> CachedValue {
        CachedValue::Progress(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Progress(progress) => Some(*progress),
            _ => None,
        }
    }
}

impl CacheValue for Arc<MemoRecord> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Memo(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Memo(memo) => Some(Arc::clone(memo)),
            _ => None,
        }
    }
}

impl CacheValue for Arc<Vec<String>> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Names(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Names(names) => Some(Arc::clone(names)),
            _ => None,
        }
    }
}

/// One cache slot. Value and fetch time are always replaced together.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub(crate) value: Option<CachedValue>,
    pub(crate) fetched_at: Option<Instant>,
    pub(crate) stale_after: Duration,
    /// Generation at which the stored value's fetch began.
    pub(crate) fetched_gen: u64,
    /// Generation of the latest invalidation of this key.
    pub(crate) invalidated_gen: u64,
}

impl CacheEntry {
    /// Placeholder that only records an invalidation.
    pub(crate) fn tombstone(invalidated_gen: u64) -> Self {
        Self {
            value: None,
            fetched_at: None,
            stale_after: Duration::ZERO,
            fetched_gen: 0,
            invalidated_gen,
        }
    }

    /// Returns the stored value, if any.
    #[inline]
    pub fn value(&self) -> Option<&CachedValue> {
        self.value.as_ref()
    }

    /// Returns when the stored value was fetched.
    #[inline]
    pub fn fetched_at(&self) -> Option<Instant> {
        self.fetched_at
    }

    #[inline]
    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// `true` once an invalidation newer than the fetch has been recorded.
    #[inline]
    pub fn is_invalidated(&self) -> bool {
        self.invalidated_gen > self.fetched_gen
    }

    /// `true` once the staleness threshold has elapsed.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.fetched_at {
            Some(at) => now.saturating_duration_since(at) >= self.stale_after,
            None => true,
        }
    }
}

/// Outcome of a cache read. Reads never block and never fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead<V> {
    /// Present and usable without a refetch.
    Fresh(V),
    /// Present but invalidated or past its threshold; show it and refetch.
    Stale(V),
    Missing,
}

impl<V> CacheRead<V> {
    #[inline]
    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheRead::Fresh(_))
    }

    #[inline]
    pub fn is_stale(&self) -> bool {
        matches!(self, CacheRead::Stale(_))
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, CacheRead::Missing)
    }

    /// Returns the value regardless of freshness.
    pub fn into_value(self) -> Option<V> {
        match self {
            CacheRead::Fresh(v) | CacheRead::Stale(v) => Some(v),
            CacheRead::Missing => None,
        }
    }

    /// Returns the value only if it is fresh.
    pub fn fresh(self) -> Option<V> {
        match self {
            CacheRead::Fresh(v) => Some(v),
            _ => None,
        }
    }
}

/// Proof that a fetch for `key` began at `generation`.
///
/// A value stored with a ticket older than the key's last invalidation stays stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub(crate) key: CacheKey,
    pub(crate) generation: u64,
}

impl FetchTicket {
    #[inline]
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
