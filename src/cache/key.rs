//! Semantic cache keys.

use crate::api::MemoId;
use crate::hashing::{hash_to_u64, query_fingerprint};
use crate::search::SearchMode;

/// Addressable cache slot, one per semantic query tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `(search, mode, text)`.
    Search { mode: SearchMode, text: String },
    /// `(vectorize-progress)`.
    Progress,
    /// `(memo, id)`.
    Memo(MemoId),
    /// `(categories)`.
    Categories,
    /// `(tags)`.
    Tags,
}

impl CacheKey {
    #[inline]
    pub fn search(mode: SearchMode, text: impl Into<String>) -> Self {
        Self::Search {
            mode,
            text: text.into(),
        }
    }

    #[inline]
    pub fn memo(id: &MemoId) -> Self {
        Self::Memo(id.clone())
    }

    /// Returns the invalidation scope this key belongs to.
    #[inline]
    pub fn scope(&self) -> KeyScope {
        match self {
            CacheKey::Search { .. } => KeyScope::Search,
            CacheKey::Progress => KeyScope::Progress,
            CacheKey::Memo(_) => KeyScope::Memo,
            CacheKey::Categories | CacheKey::Tags => KeyScope::Catalog,
        }
    }
}

/// Writes a log-safe form of the key: search text and memo ids are fingerprinted.
impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Search { mode, text } => write!(
                f,
                "search/{}/{:016x}",
                mode,
                query_fingerprint(mode.as_str(), text)
            ),
            CacheKey::Progress => f.write_str("vectorize-progress"),
            CacheKey::Memo(id) => write!(f, "memo/{:016x}", hash_to_u64(id.as_str().as_bytes())),
            CacheKey::Categories => f.write_str("categories"),
            CacheKey::Tags => f.write_str("tags"),
        }
    }
}

/// Group of keys invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScope {
    /// Every `(search, mode, text)` key.
    Search,
    Progress,
    /// Every `(memo, id)` key.
    Memo,
    /// Category and tag listings.
    Catalog,
}

impl KeyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyScope::Search => "search",
            KeyScope::Progress => "progress",
            KeyScope::Memo => "memo",
            KeyScope::Catalog => "catalog",
        }
    }
}

impl std::fmt::Display for KeyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
