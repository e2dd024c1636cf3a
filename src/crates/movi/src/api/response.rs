//! API response helpers

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Error body for transport-level failures (bad JSON, unknown route)
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

/// Create a 200 OK JSON response
pub fn ok<T: Serialize>(body: T) -> impl IntoResponse {
    (StatusCode::OK, Json(body))
}

/// Create a 400 Bad Request error response
pub fn bad_request(message: impl Into<String>) -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            success: false,
            message: message.into(),
        }),
    )
}

/// Create a 503 Service Unavailable error response
pub fn unavailable(message: impl Into<String>) -> impl IntoResponse {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            success: false,
            message: message.into(),
        }),
    )
}
