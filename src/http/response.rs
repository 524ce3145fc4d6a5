//! Response envelope and error mapping.
//!
//! # Responsibilities
//! - Wrap every outcome in `{success, data}` or `{success: false, message, error?}`
//! - Map each failure class to its HTTP status
//! - Log every failure that reaches the handler boundary
//!
//! # Design Decisions
//! - Envelope construction is pure; no I/O happens here
//! - Partial stats failures are data, not errors; they never reach `ApiError`

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::security::UrlRejected;
use crate::upstream::{QueryError, UpstreamError};

/// Uniform response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error,
        }
    }
}

/// Result type returned by every API handler.
pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Everything that can stop a request from producing data.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential for the requested account.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Missing or unparseable parameters.
    #[error(transparent)]
    Validation(#[from] QueryError),

    /// The query string itself could not be decoded.
    #[error("Invalid query string: {0}")]
    MalformedQuery(#[from] QueryRejection),

    /// Pagination URL outside the provider allow-list.
    #[error("Invalid URL: Only Mailgun API URLs are allowed")]
    ForbiddenUrl(#[source] UrlRejected),

    /// The upstream call failed after its retries.
    #[error("{context}")]
    Upstream {
        context: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl ApiError {
    /// Adapter for `map_err` that tags an upstream failure with the
    /// operation-level message shown to callers.
    pub fn upstream(context: &'static str) -> impl FnOnce(UpstreamError) -> ApiError {
        move |source| ApiError::Upstream { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Credentials(_) | ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) | ApiError::MalformedQuery(_) | ApiError::ForbiddenUrl(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    pub fn envelope(&self) -> Envelope<()> {
        match self {
            ApiError::Upstream { context, source } => {
                Envelope::failure(*context, Some(source.to_string()))
            }
            ApiError::ForbiddenUrl(reason) => Envelope::failure(self.to_string(), Some(reason.to_string())),
            other => Envelope::failure(other.to_string(), None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Upstream { context, source } => {
                tracing::error!(status = status.as_u16(), error = %source, "{}", context);
            }
            ApiError::Credentials(e) => {
                tracing::error!(status = status.as_u16(), error = %e, "Credential lookup failed");
            }
            other => {
                tracing::warn!(status = status.as_u16(), error = %other, "Request rejected");
            }
        }
        (status, Json(self.envelope())).into_response()
    }
}
