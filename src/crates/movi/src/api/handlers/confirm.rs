//! Confirmation entry handler

use axum::{extract::State, response::IntoResponse, Json};

use crate::api::models::{ConfirmRequest, MessageResponse};
use crate::api::response;
use crate::api::routes::AppState;

/// `POST /api/v1/agent/confirm`
pub async fn confirm(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> impl IntoResponse {
    let output = state
        .confirmation
        .confirm(request.session_id, request.confirmed, request.user_id)
        .await;
    response::ok(MessageResponse {
        agent_output: output,
        session_id: None,
    })
    .into_response()
}
