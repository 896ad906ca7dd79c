use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiError, SearchResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors surfaced by the search orchestrator. Nothing is retried automatically.
pub enum SearchError {
    /// The backend call failed.
    #[error("search failed: {0}")]
    Request(#[from] ApiError),

    /// Searching with empty text. Normally prevented by query gating.
    #[error("search query is empty")]
    EmptyQuery,

    /// The request this call was waiting on was dropped before it resolved.
    #[error("search was cancelled")]
    Cancelled,
}

impl SearchError {
    /// Returns the backend error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SearchError::Request(e) => Some(e),
            _ => None,
        }
    }
}

/// Shared, immutable result list.
pub type SearchResultSet = Arc<Vec<SearchResult>>;
