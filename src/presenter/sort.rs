use std::sync::Arc;

use crate::api::SearchResult;
use crate::search::SearchResultSet;

/// Orders a result set for display.
///
/// With empty query text the results are sorted newest first (stable for equal
/// timestamps). Otherwise the backend's relevance order is returned untouched.
pub fn arrange(results: &SearchResultSet, effective_text: &str) -> SearchResultSet {
    if !effective_text.is_empty() {
        return Arc::clone(results);
    }

    let mut sorted: Vec<SearchResult> = results.as_ref().clone();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Arc::new(sorted)
}
