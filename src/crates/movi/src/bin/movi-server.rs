//! MOVI server binary
//!
//! Boots the database (migrations + schema verification), the session
//! store and its reaper, the chat model, and the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llm::{ChatModel, ChatRequest, ChatResponse, OpenAiClient, RemoteLlmConfig, RetryingChatModel};
use tracing::{info, warn};

use movi::api::{create_router, AppState};
use movi::db::{schema, seed, Database};
use movi::{AgentContext, AgentService, AppConfig, ConfirmationService};

use flow_session::{SessionStore, SqliteSessionStore};

/// Stand-in model when no API key is configured: every call fails, which
/// sends the intent parser down its regex fallback strategy.
struct OfflineChatModel;

#[async_trait]
impl ChatModel for OfflineChatModel {
    async fn chat(&self, _request: ChatRequest) -> llm::Result<ChatResponse> {
        Err(llm::LlmError::ConfigError(
            "no model API key configured".to_string(),
        ))
    }

    fn label(&self) -> String {
        "offline".to_string()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tooling::logging::init("info,movi=debug");

    let config = AppConfig::load()?;
    info!(database_url = %config.database_url, bind_addr = %config.bind_addr, "Configuration loaded");

    // Database: migrate, verify the physical schema, optionally seed.
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;
    schema::verify(&db.pool()).await?;
    if config.seed_demo_data {
        seed::seed_demo_data(&db.pool()).await?;
    }
    let drivers_have_status = schema::drivers_have_status(&db.pool()).await?;

    // Session store plus its out-of-band reaper.
    let session_store = SqliteSessionStore::new(db.pool());
    session_store.migrate().await?;
    let sessions: Arc<dyn SessionStore> = Arc::new(session_store);
    let reaper_store = sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            match reaper_store.expire_overdue().await {
                Ok(0) => {}
                Ok(expired) => info!(expired, "expired overdue sessions"),
                Err(e) => warn!(error = %e, "session reaper failed"),
            }
        }
    });

    // Chat model: remote client behind the retry ladder, or the offline
    // stand-in when no key is present.
    let model: Arc<dyn ChatModel> = match RemoteLlmConfig::from_env(
        &config.llm.api_key_env,
        config.llm.base_url.clone(),
        config.llm.model.clone(),
    ) {
        Ok(remote) => {
            info!(model = %config.llm.model, "Using remote chat model");
            Arc::new(RetryingChatModel::new(Arc::new(OpenAiClient::new(remote)?)))
        }
        Err(e) => {
            warn!(error = %e, "No model API key; intent parsing will use the regex fallback");
            Arc::new(OfflineChatModel)
        }
    };

    let ctx = AgentContext::new(db.pool(), sessions, model, drivers_have_status);
    let agent = Arc::new(AgentService::new(ctx.clone()));
    let confirmation = Arc::new(ConfirmationService::new(ctx));

    let state = AppState {
        db: db.clone(),
        agent,
        confirmation,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "MOVI server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
