//! API error handling.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<loc_core::Error> for ApiError {
    fn from(err: loc_core::Error) -> Self {
        match err {
            loc_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            loc_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            loc_core::Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<loc_db::DbError> for ApiError {
    fn from(err: loc_db::DbError) -> Self {
        match err {
            loc_db::DbError::NotFound(msg) => ApiError::NotFound(msg),
            loc_db::DbError::Duplicate(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<loc_bus::BusError> for ApiError {
    fn from(err: loc_bus::BusError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<loc_progress::ProgressError> for ApiError {
    fn from(err: loc_progress::ProgressError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
