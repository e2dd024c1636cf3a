//! Message entry handler

use axum::{extract::State, response::IntoResponse, Json};

use crate::api::models::{MessageRequest, MessageResponse};
use crate::api::response;
use crate::api::routes::AppState;

/// `POST /api/v1/agent/message`
pub async fn message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> impl IntoResponse {
    if request.text.trim().is_empty() {
        return response::bad_request("text must not be empty").into_response();
    }

    let outcome = state.agent.handle_message(request.into_message()).await;
    response::ok(MessageResponse {
        agent_output: outcome.agent_output,
        session_id: outcome.session_id,
    })
    .into_response()
}
