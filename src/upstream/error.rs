//! Upstream call errors.

use thiserror::Error;

/// Failure of a single call to the provider API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The per-call deadline elapsed.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Connection, TLS or protocol failure.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("request failed with status code {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered 2xx but the body is not JSON.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// A request URL could not be built.
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Network(_) => "network",
            UpstreamError::Status { .. } => "status",
            UpstreamError::Decode(_) => "decode",
            UpstreamError::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
