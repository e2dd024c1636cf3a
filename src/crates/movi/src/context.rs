//! Shared per-process agent context
//!
//! Everything nodes and services need, assembled once at boot and shared
//! behind an `Arc`: the database pool, session store, chat model, action
//! catalog and tool registry. Immutable after initialisation; all
//! per-request state lives on the flow state.

use std::sync::Arc;

use flow_session::SessionStore;
use llm::ChatModel;

use crate::catalog::ActionCatalog;
use crate::db::DatabasePool;
use crate::tools::ToolRegistry;

/// Default conversation-history retention (turns)
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Shared dependencies for the agent graph
pub struct AgentContext {
    /// Database pool (bounded, process-wide)
    pub db: DatabasePool,
    /// Durable session store
    pub sessions: Arc<dyn SessionStore>,
    /// Chat model behind the retry ladder
    pub model: Arc<dyn ChatModel>,
    /// Immutable action catalog
    pub catalog: Arc<ActionCatalog>,
    /// Tool handlers keyed by action
    pub tools: Arc<ToolRegistry>,
    /// Conversation turns kept per parse
    pub history_limit: usize,
    /// Boot-time introspection: drivers table carries a status column
    pub drivers_have_status: bool,
}

impl AgentContext {
    /// Assemble a context from its parts
    pub fn new(
        db: DatabasePool,
        sessions: Arc<dyn SessionStore>,
        model: Arc<dyn ChatModel>,
        drivers_have_status: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            db,
            sessions,
            model,
            catalog: Arc::new(ActionCatalog::standard()),
            tools: Arc::new(ToolRegistry::standard()),
            history_limit: DEFAULT_HISTORY_LIMIT,
            drivers_have_status,
        })
    }
}
