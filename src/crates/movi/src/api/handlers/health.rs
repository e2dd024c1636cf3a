//! Health check handler

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::api::response;
use crate::api::routes::AppState;

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => Json(json!({"status": "ok"})).into_response(),
        Err(e) => response::unavailable(format!("database unreachable: {}", e)).into_response(),
    }
}
