use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors returned by backend calls.
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout, reset).
    #[error("network error calling {endpoint}: {message}")]
    Network {
        /// Endpoint path relative to the API root.
        endpoint: String,
        /// Transport error message.
        message: String,
    },

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body text, or the status text if the body was empty or unreadable.
        body: String,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode {
        /// Endpoint path relative to the API root.
        endpoint: String,
        /// Decoder message.
        message: String,
    },

    /// The HTTP client could not be built from the configuration.
    #[error("failed to build HTTP client: {message}")]
    ClientBuild {
        /// Builder message.
        message: String,
    },

    /// The configured API root is not a valid URL.
    #[error("invalid API base URL '{url}': {message}")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
        /// Parser message.
        message: String,
    },
}

impl ApiError {
    /// Returns the HTTP status for [`ApiError::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for 404 responses.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if no response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
