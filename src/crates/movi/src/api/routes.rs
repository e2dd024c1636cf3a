//! API route definitions

use std::sync::Arc;

use axum::{routing::get, routing::post, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::db::Database;
use crate::services::{AgentService, ConfirmationService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub agent: Arc<AgentService>,
    pub confirmation: Arc<ConfirmationService>,
}

/// Build the complete API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/agent/message", post(handlers::message))
        .route("/api/v1/agent/confirm", post(handlers::confirm))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
