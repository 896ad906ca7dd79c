use crate::api::{IndexingJobService, MemoStore, SearchResult, SearchService};
use crate::search::{SearchResultSet, SearchStatus};

/// Everything a session needs from the backend.
pub trait Backend: SearchService + MemoStore + IndexingJobService + 'static {}

impl<T> Backend for T where T: SearchService + MemoStore + IndexingJobService + 'static {}

/// The current page of the displayed search, already ordered for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    results: SearchResultSet,
    /// 1-based page number.
    pub page: usize,
    pub total_pages: usize,
    /// Offset of the first item on this page.
    pub start: usize,
    end: usize,
    pub status: SearchStatus,
    /// Message of the latest failed fetch; earlier results stay on the page.
    pub error: Option<String>,
}

impl PageView {
    pub(crate) fn new(
        results: SearchResultSet,
        page: usize,
        total_pages: usize,
        start: usize,
        len: usize,
    ) -> Self {
        Self {
            results,
            page,
            total_pages,
            start,
            end: start + len,
            status: SearchStatus::Idle,
            error: None,
        }
    }

    pub(crate) fn with_status(mut self, status: SearchStatus, error: Option<String>) -> Self {
        self.status = status;
        self.error = error;
        self
    }

    /// Results on this page.
    #[inline]
    pub fn items(&self) -> &[SearchResult] {
        &self.results[self.start..self.end]
    }

    /// Results across all pages.
    #[inline]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[inline]
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}
