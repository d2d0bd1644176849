//! Errors raised while talking to the backend

use thiserror::Error;

/// Result type for backend calls
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never produced a response
    #[error("request to {url} failed: {details}")]
    Transport { url: String, details: String },

    /// Backend answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    /// Response body did not match the wire schema
    #[error("could not decode response from {url}: {details}")]
    Decode { url: String, details: String },
}

impl ApiError {
    pub fn transport(url: impl Into<String>, details: impl ToString) -> Self {
        ApiError::Transport { url: url.into(), details: details.to_string() }
    }

    pub fn decode(url: impl Into<String>, details: impl ToString) -> Self {
        ApiError::Decode { url: url.into(), details: details.to_string() }
    }
}
