/// Unified error types for inkpost
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors (missing/invalid credentials or tokens)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors (authenticated but not allowed)
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate account, already verified)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Token signing errors
    #[error("Token error: {0}")]
    Jwt(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Database(_)
            | ApiError::Jwt(_)
            | ApiError::Internal(_)
            | ApiError::Io(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Result type alias for backend operations
pub type ApiResult<T> = Result<T, ApiError>;
