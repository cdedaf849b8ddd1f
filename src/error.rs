//! Client-facing errors and their JSON envelopes
//!
//! Every failure a request can hit ends up as an [`ApiError`]; its
//! `IntoResponse` impl is the one place that decides status codes and bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::cache::StoreError;
use crate::data::{GitHubError, UpstreamError};

/// Message returned when the `username` query parameter is missing
pub const USERNAME_REQUIRED: &str = "Username is required";

/// API error type that converts to appropriate HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid client input
    #[error("{0}")]
    Validation(String),

    /// Non-success status from the upstream API, passed through as-is
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The upstream API could not be reached at all
    #[error("failed to reach upstream: {0}")]
    Network(String),

    /// Cache backend failure; only produced by an explicit cache flush
    #[error("cache store error: {0}")]
    Store(#[from] StoreError),

    /// Unknown path
    #[error("not found")]
    NotFound,

    /// Known path, wrong method
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Anything else (undecodable upstream body, serialization)
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GitHubError> for ApiError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Upstream(e) => Self::Upstream(e),
            GitHubError::RequestFailed(e) => Self::Network(e.to_string()),
            GitHubError::ParseError(e) => {
                Self::Internal(format!("undecodable upstream response: {e}"))
            }
            GitHubError::InvalidConfig(msg) => Self::Internal(msg),
        }
    }
}

/// `detail` is a plain message, or the full upstream error object
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Detail<'a> {
    Message(&'a str),
    Upstream(&'a UpstreamError),
}

/// JSON error response body
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    detail: Detail<'a>,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(e) => {
                StatusCode::from_u16(e.status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Network(_) | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self {
            Self::Validation(msg) => Detail::Message(msg),
            Self::Upstream(e) => {
                tracing::info!(status = e.status, detail = %e.detail, "upstream error passed through");
                Detail::Upstream(e)
            }
            Self::Network(err) => {
                tracing::error!(error = %err, "upstream unreachable");
                Detail::Message("Failed to reach upstream")
            }
            Self::Store(err) => {
                tracing::error!(error = %err, "cache store error");
                Detail::Message("Failed to clear cache")
            }
            Self::NotFound => Detail::Message("Not Found"),
            Self::MethodNotAllowed => Detail::Message("Method Not Allowed"),
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                Detail::Message("Internal server error")
            }
        };

        let body = Json(ErrorResponse { detail }).into_response();
        (self.status(), body).into_response()
    }
}
