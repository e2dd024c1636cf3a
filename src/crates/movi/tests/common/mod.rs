//! Shared test harness
//!
//! Builds an agent over an in-memory SQLite database (single connection,
//! so every handle sees the same data), the seeded demo fixtures and a
//! scripted chat model.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use flow_session::{SessionStore, SqliteSessionStore};
use llm::testing::ScriptedChatModel;
use llm::ChatModel;

use movi::db::{schema, seed};
use movi::services::{AgentService, ConfirmationService, IncomingMessage};
use movi::state::Page;
use movi::AgentContext;

pub struct TestAgent {
    pub pool: SqlitePool,
    pub model: Arc<ScriptedChatModel>,
    pub agent: AgentService,
    pub confirmation: ConfirmationService,
}

/// Build a full agent around scripted model responses
pub async fn agent_with_responses(responses: Vec<&str>) -> TestAgent {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    seed::seed_demo_data(&pool).await.expect("seed data");

    let session_store = SqliteSessionStore::new(pool.clone());
    session_store.migrate().await.expect("session table");
    let sessions: Arc<dyn SessionStore> = Arc::new(session_store);

    let model = Arc::new(ScriptedChatModel::sequence(
        responses.into_iter().map(str::to_string).collect(),
    ));
    let chat_model: Arc<dyn ChatModel> = model.clone();

    let drivers_have_status = schema::drivers_have_status(&pool).await.expect("introspection");
    let ctx = AgentContext::new(pool.clone(), sessions, chat_model, drivers_have_status);

    TestAgent {
        pool,
        model,
        agent: AgentService::new(ctx.clone()),
        confirmation: ConfirmationService::new(ctx),
    }
}

/// A plain dashboard message
pub fn dashboard_message(text: &str) -> IncomingMessage {
    IncomingMessage {
        text: text.to_string(),
        user_id: 1,
        page: Some(Page::Dashboard),
        ..Default::default()
    }
}

/// A manageRoute message
pub fn manage_route_message(text: &str) -> IncomingMessage {
    IncomingMessage {
        text: text.to_string(),
        user_id: 1,
        page: Some(Page::ManageRoute),
        ..Default::default()
    }
}

/// Current live_status of a trip
pub async fn trip_status(pool: &SqlitePool, trip_id: i64) -> String {
    let row: (String,) = sqlx::query_as("SELECT live_status FROM trips WHERE id = ?")
        .bind(trip_id)
        .fetch_one(pool)
        .await
        .expect("trip row");
    row.0
}

/// Number of audit rows
pub async fn audit_count(pool: &SqlitePool) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_log")
        .fetch_one(pool)
        .await
        .expect("audit count");
    row.0
}
