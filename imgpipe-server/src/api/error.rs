//! API Error Handling
//!
//! Unified error types and conversion for API responses.
//! Every error body has the shape `{ "error": { "code", "message" } }`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use imgpipe_core::dto::error::ErrorBody;

use crate::service::JobError;
use crate::storage::{GrantError, StorageError};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// No usable bearer token was presented
    Unauthenticated(String),
    /// A token or grant was presented but did not verify
    InvalidToken(String),
    BadCredentials,
    BadRequest(String),
    NotFound(String),
    /// The job is in the wrong status for the request
    BadState(String),
    InternalError(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::InvalidToken(_) => "invalid_token",
            ApiError::BadCredentials => "bad_credentials",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadState(_) => "bad_state",
            ApiError::InternalError(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) | ApiError::InvalidToken(_) | ApiError::BadCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::BadRequest(_) | ApiError::BadState(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            ApiError::Unauthenticated(msg)
            | ApiError::InvalidToken(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::BadState(msg) => msg,
            ApiError::BadCredentials => "Invalid username or password".to_string(),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::InvalidArgument(err) => ApiError::BadRequest(err.to_string()),
            JobError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            err @ JobError::InvalidState(_) => ApiError::BadState(err.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => ApiError::NotFound(format!("Object {} not found", key)),
            StorageError::InvalidKey(key) => {
                ApiError::BadRequest(format!("Invalid object key {:?}", key))
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<GrantError> for ApiError {
    fn from(err: GrantError) -> Self {
        match err {
            GrantError::Missing => ApiError::InvalidToken("Missing token".to_string()),
            other => ApiError::InvalidToken(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
