use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors reported by the job tracker.
pub enum JobError {
    /// The job-start request failed.
    #[error("failed to start indexing job: {0}")]
    StartFailed(#[from] ApiError),

    /// Progress polling failed too many times in a row.
    #[error("progress polling failed {attempts} times in a row: {source}")]
    PollFailed {
        attempts: u32,
        #[source]
        source: ApiError,
    },

    /// The rebuild request failed.
    #[error("index rebuild failed: {0}")]
    RebuildFailed(#[source] ApiError),
}

impl JobError {
    /// Returns the underlying backend error.
    pub fn api_error(&self) -> &ApiError {
        match self {
            JobError::StartFailed(e) | JobError::RebuildFailed(e) => e,
            JobError::PollFailed { source, .. } => source,
        }
    }
}

pub type JobResult<T> = Result<T, JobError>;
