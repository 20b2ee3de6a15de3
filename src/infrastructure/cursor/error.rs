//! Error types for the Cursor background-agent API.

use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::infrastructure::http::Transient;

/// Errors from the agents endpoint.
#[derive(Error, Debug)]
pub enum CursorApiError {
    /// Request was malformed or rejected by validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// API key is missing or rejected.
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// Agent does not exist on the service side.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Server-side error (5xx).
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Response arrived but could not be interpreted.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Network or protocol failure.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Any status we do not classify.
    #[error("Unexpected response ({0}): {1}")]
    UnknownError(StatusCode, String),
}

impl Transient for CursorApiError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError(_, _) | Self::NetworkError(_)
        )
    }
}

impl From<CursorApiError> for DomainError {
    fn from(err: CursorApiError) -> Self {
        Self::AgentRequestFailed(err.to_string())
    }
}
