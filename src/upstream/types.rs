//! Upstream error definitions.

use thiserror::Error;

/// Errors that can occur when calling an external API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request did not complete within the configured timeout.
    #[error("{service} timed out")]
    Timeout { service: &'static str },

    /// Connection or protocol failure.
    #[error("{service} request failed: {message}")]
    Transport { service: &'static str, message: String },

    /// The API answered with a non-success status.
    #[error("{service} returned status {status}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("{service} returned an unexpected payload: {message}")]
    Decode { service: &'static str, message: String },

    /// The API answered but had nothing for the query.
    #[error("{0}")]
    NotFound(String),
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

impl UpstreamError {
    /// Short label used for metrics and span attributes.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout { .. } => "timeout",
            UpstreamError::Transport { .. } => "transport",
            UpstreamError::Status { .. } => "status",
            UpstreamError::Decode { .. } => "decode",
            UpstreamError::NotFound(_) => "not_found",
        }
    }
}
