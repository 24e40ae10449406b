//! Uniform error responses for the HTTP API.
//!
//! Handlers never let a failure escape as a raw error. Every failure is turned
//! into an [`ApiError`] carrying the human readable message for the operation
//! that failed, and rendered as `{"message": "..."}` with a matching status.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::repo::StoreError;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// A referenced id does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The request body could not be parsed.
    #[error("{0}")]
    ParseError(String),
    /// The request body parsed but broke a validation rule.
    #[error("{message}")]
    Validation { message: String, errors: Vec<String> },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    /// Anything else. The cause is logged, only the message reaches the client.
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ParseError(_) => StatusCode::BAD_REQUEST,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds an `Unknown` error and logs its cause.
    pub fn unknown(cause: impl std::fmt::Display, message: &str) -> Self {
        tracing::error!(error = %cause, "{message}");
        Self::Unknown(message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation { message, errors } => ErrorBody { message, errors },
            other => ErrorBody {
                message: other.to_string(),
                errors: Vec::new(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Attaches an operation's failure message to a store result.
pub trait OrApiError<T> {
    fn or_api_error(self, message: &str) -> Result<T, ApiError>;
}

impl<T> OrApiError<T> for Result<T, StoreError> {
    fn or_api_error(self, message: &str) -> Result<T, ApiError> {
        self.map_err(|err| match err {
            StoreError::NotFound(_) => ApiError::NotFound(message.to_string()),
            StoreError::Conflict(_) => ApiError::Conflict(message.to_string()),
            StoreError::Database(err) => ApiError::unknown(err, message),
        })
    }
}

impl<T> OrApiError<T> for Result<T, JsonRejection> {
    fn or_api_error(self, message: &str) -> Result<T, ApiError> {
        self.map_err(|rejection| {
            tracing::debug!(error = %rejection.body_text(), "rejected request body");
            ApiError::ParseError(message.to_string())
        })
    }
}
