use std::sync::Arc;

use super::error::{SearchError, SearchResultSet};
use super::mode::SearchMode;
use crate::cache::CacheKey;
use crate::hashing::query_fingerprint;

/// One logical search request. A new query supersedes any in-flight one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Query {
    pub text: String,
    pub mode: SearchMode,
}

impl Query {
    pub fn new(text: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            text: text.into(),
            mode,
        }
    }

    /// Only non-empty queries reach the network.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.text.is_empty()
    }

    #[inline]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::search(self.mode, self.text.clone())
    }

    /// Log-safe fingerprint of the query.
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        query_fingerprint(self.mode.as_str(), &self.text)
    }
}

/// Lifecycle of the displayed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    /// Empty query; nothing requested.
    #[default]
    Idle,
    /// First fetch for the query, nothing to show yet.
    Loading,
    Success,
    /// The latest fetch failed; previous results stay visible.
    Error,
}

/// What a UI renders for the search slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot {
    /// The effective (debounced) query being displayed.
    pub query: Query,
    pub status: SearchStatus,
    pub results: SearchResultSet,
    pub error: Option<SearchError>,
    /// `true` while a network call for `query` is in flight, including background
    /// revalidation of displayed results.
    pub is_fetching: bool,
    /// Sequence number of the request this snapshot belongs to.
    pub seq: u64,
}

impl Default for SearchSnapshot {
    fn default() -> Self {
        Self {
            query: Query::default(),
            status: SearchStatus::Idle,
            results: Arc::new(Vec::new()),
            error: None,
            is_fetching: false,
            seq: 0,
        }
    }
}

impl SearchSnapshot {
    #[inline]
    pub fn is_loading(&self) -> bool {
        self.status == SearchStatus::Loading
    }

    /// Human-readable error message of the latest failed fetch.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}
