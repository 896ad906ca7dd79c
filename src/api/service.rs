//! Backend collaborator traits.
//!
//! The orchestration layer only sees these traits; [`super::HttpBackend`] implements all
//! three over HTTP and [`super::MockBackend`] implements them in memory for tests.

use async_trait::async_trait;

use super::error::ApiResult;
use super::model::{
    CreatedMemo, JobProgress, MemoDraft, MemoId, MemoRecord, MemoUpdate, SearchResult,
    StatusResponse,
};
use crate::search::SearchMode;

#[async_trait]
/// Full-text, semantic and hybrid search.
pub trait SearchService: Send + Sync {
    /// Runs one search. All modes share this single entry point.
    async fn search(&self, mode: SearchMode, query: &str) -> ApiResult<Vec<SearchResult>>;
}

#[async_trait]
/// Memo persistence plus category/tag listings.
pub trait MemoStore: Send + Sync {
    /// Creates a memo and returns its identifier.
    async fn create_memo(&self, draft: &MemoDraft) -> ApiResult<CreatedMemo>;
    /// Reads one memo.
    async fn get_memo(&self, id: &MemoId) -> ApiResult<MemoRecord>;
    /// Replaces a memo's title and body; returns the updated record.
    async fn update_memo(&self, id: &MemoId, update: &MemoUpdate) -> ApiResult<MemoRecord>;
    /// Deletes a memo.
    async fn delete_memo(&self, id: &MemoId) -> ApiResult<StatusResponse>;
    /// Lists known categories.
    async fn list_categories(&self) -> ApiResult<Vec<String>>;
    /// Lists known tags.
    async fn list_tags(&self) -> ApiResult<Vec<String>>;
}

#[async_trait]
/// Background indexing ("vectorization") job control.
pub trait IndexingJobService: Send + Sync {
    /// Starts an incremental indexing job.
    async fn start_incremental(&self) -> ApiResult<StatusResponse>;
    /// Reports the current job progress.
    async fn progress(&self) -> ApiResult<JobProgress>;
    /// Rebuilds the whole index.
    async fn rebuild(&self) -> ApiResult<StatusResponse>;
}
