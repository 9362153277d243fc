use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Errors surfaced by queries, mutations and the mock API.
///
/// Cached query states carry the last error next to the last good data, so
/// every variant holds owned strings and the type is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Transport failure: connection refused, DNS, TLS, reset.
    Network(String),
    /// The remote answered with a non-success status.
    Remote { status: u16, message: String },
    NotFound(String),
    BadRequest(String),
    /// A required field was missing; caught before any request is issued.
    Validation(String),
    Unauthorized(String),
    TimeoutError(String),
    SerializationError(String),
    ConfigurationError(String),
    Internal(String),
}

/// Coarse classification used by views to decide how an error is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Toast/banner; stale data stays on screen.
    Remote,
    /// Keeps the originating form open for correction.
    Validation,
    /// Rendered as an empty state rather than an error.
    NotFound,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Network(_)
            | AppError::Remote { .. }
            | AppError::TimeoutError(_)
            | AppError::Unauthorized(_) => ErrorKind::Remote,
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::SerializationError(_)
            | AppError::ConfigurationError(_)
            | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Build an error from an HTTP status and the response body text.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => AppError::Validation(message),
            401 | 403 => AppError::Unauthorized(message),
            404 => AppError::NotFound(message),
            408 | 504 => AppError::TimeoutError(message),
            _ => AppError::Remote { status, message },
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Remote { status, message } => {
                write!(f, "Remote error ({}): {}", status, message)
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::TimeoutError(msg) => write!(f, "Timeout error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Network(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Remote { status, message } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                message.clone(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::TimeoutError(msg) => (StatusCode::REQUEST_TIMEOUT, msg.clone()),
            AppError::SerializationError(msg) => {
                tracing::error!("Serialization error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::ConfigurationError(msg) | AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::TimeoutError(err.to_string())
        } else if let Some(status) = err.status() {
            AppError::from_status(status.as_u16(), err.to_string())
        } else if err.is_decode() {
            AppError::SerializationError(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(AppError::from_status(404, "gone").kind(), ErrorKind::NotFound);
        assert_eq!(AppError::from_status(400, "name").kind(), ErrorKind::Validation);
        assert_eq!(AppError::from_status(503, "down").kind(), ErrorKind::Remote);
        assert_eq!(
            AppError::from_status(500, "boom"),
            AppError::Remote { status: 500, message: "boom".to_string() }
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::Validation("name is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::NotFound("team 9".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
