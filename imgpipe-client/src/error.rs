//! Error types for the imgpipe client

use imgpipe_core::dto::error::ErrorBody;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the imgpipe client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}, {code}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error code from the body, `unknown` if the body had none
        code: String,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The endpoint needs a bearer token and none is set
    #[error("Not logged in: no bearer token configured")]
    MissingToken,
}

impl ClientError {
    /// Build an API error from a status code and the raw response body
    pub fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self::ApiError {
                status,
                code: parsed.error.code,
                message: parsed.error.message,
            },
            Err(_) => Self::ApiError {
                status,
                code: "unknown".to_string(),
                message: body.trim().to_string(),
            },
        }
    }

    /// Error code reported by the server, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::ApiError { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// The job was in the wrong status for the request
    pub fn is_bad_state(&self) -> bool {
        self.code() == Some("bad_state")
    }

    /// Check if the server refused the caller's credentials or token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::MissingToken | Self::ApiError { status: 401, .. })
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_body() {
        let err = ClientError::from_body(
            400,
            r#"{"error":{"code":"bad_state","message":"Job is done"}}"#,
        );

        assert!(err.is_bad_state());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "API error (status 400, bad_state): Job is done");
    }

    #[test]
    fn test_from_plain_body() {
        let err = ClientError::from_body(502, "Bad Gateway\n");

        assert_eq!(err.code(), Some("unknown"));
        assert!(err.is_server_error());
        assert!(matches!(err, ClientError::ApiError { message, .. } if message == "Bad Gateway"));
    }

    #[test]
    fn test_unauthorized() {
        assert!(ClientError::MissingToken.is_unauthorized());
        assert!(ClientError::from_body(401, "{}").is_unauthorized());
        assert!(ClientError::from_body(404, "").is_not_found());
    }
}
