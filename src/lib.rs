//! Quill client library: the orchestration layer between a memo UI and the memo
//! service backend.
//!
//! # Public API Surface
//!
//! ## Session
//! - [`Session`] - Owns the cache, the search slot, the job tracker and presenter state
//! - [`Config`], [`ConfigError`] - Environment-backed configuration
//!
//! ## Search
//! - [`Debouncer`] - Trailing-edge debounce over a `watch` channel
//! - [`SearchOrchestrator`], [`Query`], [`SearchMode`], [`SearchSnapshot`] - Debounced,
//!   cache-first search with supersession of stale responses
//!
//! ## Presentation
//! - [`arrange`], [`Paginator`], [`Selection`] - Ordering, paging and selection
//! - [`make_snippet`], [`snippet`], [`preview`], [`format_timestamp`], [`format_local`] - Display helpers
//!
//! ## Indexing job
//! - [`JobTracker`], [`JobState`], [`JobSnapshot`] - Start and follow the indexing job
//!
//! ## Cache
//! - [`QueryCache`], [`CacheKey`], [`KeyScope`] - Session cache with key and scope
//!   invalidation
//!
//! ## Backend
//! - [`HttpBackend`] - reqwest implementation of [`SearchService`], [`MemoStore`] and
//!   [`IndexingJobService`]
//!
//! ## Test/Mock Support
//! [`MockBackend`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod debounce;
pub mod hashing;
pub mod job;
pub mod presenter;
pub mod search;
pub mod session;

#[cfg(any(test, feature = "mock"))]
pub use api::{MockBackend, ScriptedSearch, memo_fixture};
pub use api::{
    ApiError, ApiResult, CreatedMemo, HttpBackend, IndexingJobService, JobProgress, MemoDraft,
    MemoId, MemoRecord, MemoStore, MemoUpdate, SearchResult, SearchService, StatusResponse,
    parse_tags,
};
pub use cache::{CacheKey, CacheRead, KeyScope, QueryCache, SharedCache};
pub use config::{Config, ConfigError};
pub use constants::{DEFAULT_TIMESTAMP_PATTERN, PAGE_SIZE};
pub use debounce::Debouncer;
pub use hashing::{hash_to_u64, query_fingerprint};
pub use job::{JobConfig, JobError, JobResult, JobSnapshot, JobState, JobTracker, StartOutcome};
pub use presenter::{
    Paginator, ResultPage, Selection, arrange, format_in, format_local, format_timestamp,
    make_snippet, preview, snippet, total_pages,
};
pub use search::{
    Query, SearchConfig, SearchError, SearchMode, SearchOrchestrator, SearchResultSet,
    SearchSnapshot, SearchStatus,
};
pub use session::{Backend, PageView, Session, SessionError, SessionResult};
