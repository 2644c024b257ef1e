//! Error types for the store front ends
//!
//! The TTL store itself never fails; these errors belong to the HTTP layer and
//! the storage collaborator.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == API Error Enum ==
/// Unified error type for the HTTP front end.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found or expired
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == Storage Error Enum ==
/// Failures reported by a backing `Storage`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(ErrorResponse::new(message));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP front end.
pub type Result<T> = std::result::Result<T, ApiError>;
