//! HTTP error types for `Miraxr` server.
//!
//! Maps domain errors from `miraxr-core` into HTTP responses. Every error
//! produces a JSON body with a machine-readable `error` field and a
//! human-readable `message`. Internal errors are logged with full detail and
//! answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use miraxr_core::error::{ContextError, EulaError, RenderError};

/// Application-level error returned from HTTP handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Requested page, document, or translation not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Client sent invalid input (e.g. a malformed login context header).
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ContextError> for AppError {
    fn from(err: ContextError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<EulaError> for AppError {
    fn from(err: EulaError) -> Self {
        match err {
            EulaError::NotFound { .. } | EulaError::LocaleNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            EulaError::InvalidMetadata { .. } | EulaError::Io { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::TemplateNotFound { .. } => Self::NotFound(err.to_string()),
            RenderError::Render { .. } => Self::Internal(err.to_string()),
        }
    }
}
