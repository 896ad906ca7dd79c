//! Backend access: wire models, collaborator traits, the reqwest backend and a mock.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;
pub mod service;


pub use client::HttpBackend;
pub use error::{ApiError, ApiResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBackend, ScriptedSearch, memo_fixture};
pub use model::{
    CreatedMemo, JobProgress, MemoDraft, MemoId, MemoRecord, MemoUpdate, SearchResult,
    StatusResponse, parse_tags,
};
pub use service::{IndexingJobService, MemoStore, SearchService};
