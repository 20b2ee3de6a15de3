//! Transform service error types.

use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::infrastructure::http::Transient;

/// Errors from the prompt transformation endpoint.
#[derive(Error, Debug)]
pub enum TransformApiError {
    /// Input rejected before any network call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Endpoint not found (HTTP 404)
    #[error("Transform endpoint not found")]
    NotFound,

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded,

    /// Server error (HTTP 5xx)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// The endpoint answered 2xx but reported failure in the body
    #[error("Transform service error: {0}")]
    ServiceError(String),

    /// The endpoint answered 2xx with no usable prompt
    #[error("Transform service returned an empty result")]
    EmptyResult,

    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Unexpected status code
    #[error("Unknown error ({0}): {1}")]
    UnknownError(StatusCode, String),
}

impl Transient for TransformApiError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError(_, _) | Self::NetworkError(_)
        )
    }
}

impl From<TransformApiError> for DomainError {
    fn from(err: TransformApiError) -> Self {
        Self::TransformFailed(err.to_string())
    }
}
