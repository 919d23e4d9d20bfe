//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! An unreachable issuance service is a `503`, kept apart from an `invalid`
//! verdict (which is a normal `200`). Internal error details are logged,
//! never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::VerificationError;

/// Message returned when the issuance service cannot be consulted.
pub const ISSUANCE_UNAVAILABLE: &str =
    "Service temporarily unavailable: Cannot connect to issuance service";

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always false.
    pub success: bool,
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body missing, malformed, or failing validation (400).
    #[error("{0}")]
    BadRequest(String),

    /// No route matched (404).
    #[error("{0}")]
    NotFound(String),

    /// A dependency could not be reached (503). The detail is logged; the
    /// client sees [`ISSUANCE_UNAVAILABLE`].
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::ServiceUnavailable(detail) => {
                tracing::warn!(error = %detail, "dependency unavailable");
                ISSUANCE_UNAVAILABLE.to_string()
            }
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                "Internal server error while verifying credential".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<kcred_core::ValidationError> for AppError {
    fn from(err: kcred_core::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::OracleUnavailable(_) => Self::ServiceUnavailable(err.to_string()),
            VerificationError::StorageFailure(_) | VerificationError::Interrupted(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
