use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::job::JobError;
use crate::search::SearchError;

/// Errors surfaced by [`super::Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A memo read, write or listing failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Job(#[from] JobError),

    /// A memo draft with every field empty.
    #[error("memo draft is empty")]
    BlankDraft,
}

impl SessionError {
    /// Returns the backend error behind this failure, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api(e) => Some(e),
            SessionError::Search(e) => e.api_error(),
            SessionError::Job(e) => Some(e.api_error()),
            SessionError::Config(_) | SessionError::BlankDraft => None,
        }
    }

    /// Returns `true` if the backend reported the memo as missing.
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
