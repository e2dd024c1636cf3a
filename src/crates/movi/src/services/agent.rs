//! Message entry: run the agent graph end-to-end
//!
//! One `AgentService` per process. For each inbound message it builds the
//! flow state, restores any active wizard session for the user, runs the
//! graph and returns the response envelope. The graph itself is built
//! once and shared; all per-request state is on the flow state.

use std::sync::Arc;

use flow_core::Graph;
use tracing::{error, warn};
use uuid::Uuid;

use crate::context::AgentContext;
use crate::error::{ErrorInfo, ErrorKind};
use crate::nodes::build_graph;
use crate::state::{ConversationTurn, FinalOutput, FlowState, OutputStatus, Page};
use crate::wizard::WizardState;

/// One inbound message, already lifted out of the transport envelope
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    /// User input; may begin with the structured-command marker
    pub text: String,
    /// Caller identity (default 1)
    pub user_id: i64,
    /// UI page, when known
    pub page: Option<Page>,
    /// UI-selected trip
    pub selected_trip_id: Option<i64>,
    /// UI-selected route
    pub selected_route_id: Option<i64>,
    /// Text came from OCR extraction
    pub from_image: bool,
    /// Caller-supplied history (merged with session history)
    pub conversation_history: Vec<ConversationTurn>,
}

/// Outcome of one message: the envelope plus the session handle
#[derive(Debug, Clone)]
pub struct MessageOutcome {
    /// The response envelope
    pub agent_output: FinalOutput,
    /// Session awaiting the user's next turn, if any
    pub session_id: Option<Uuid>,
}

/// The message entry point
pub struct AgentService {
    ctx: Arc<AgentContext>,
    graph: Graph<FlowState>,
}

impl AgentService {
    /// Build the service (and its graph) over a shared context
    pub fn new(ctx: Arc<AgentContext>) -> Self {
        let graph = build_graph(ctx.clone());
        Self { ctx, graph }
    }

    /// Shared context (used by the confirmation controller)
    pub fn context(&self) -> Arc<AgentContext> {
        self.ctx.clone()
    }

    /// Run the graph for one message
    pub async fn handle_message(&self, message: IncomingMessage) -> MessageOutcome {
        let mut state = FlowState::new(message.user_id, message.text);
        state.page = message.page;
        state.selected_trip_id = message.selected_trip_id;
        state.selected_route_id = message.selected_route_id;
        state.from_image = message.from_image;
        state.conversation_history = message.conversation_history;

        self.restore_wizard(&mut state).await;
        self.stitch_history(&mut state);

        let final_state = match self.graph.run(state).await {
            Ok(final_state) => final_state,
            Err(e) => {
                // Structural graph errors are bugs, not user errors; keep
                // the envelope stable anyway.
                error!(error = %e, "graph run failed structurally");
                return MessageOutcome {
                    agent_output: internal_error_output(),
                    session_id: None,
                };
            }
        };

        let agent_output = final_state.final_output.unwrap_or_else(|| {
            error!("graph terminated without a final output");
            internal_error_output()
        });
        let session_id = agent_output.session_id;
        MessageOutcome {
            agent_output,
            session_id,
        }
    }

    /// Restore an active wizard session for this user, if any
    async fn restore_wizard(&self, state: &mut FlowState) {
        let session = match self.ctx.sessions.find_active_wizard(state.user_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "wizard lookup failed");
                return;
            }
        };
        let Some(session) = session else { return };

        match serde_json::from_value::<WizardState>(session.payload.clone()) {
            Ok(wizard) => {
                state.wizard = Some(wizard);
                state.wizard_session_id = Some(session.session_id);
                if let Ok(history) =
                    serde_json::from_value::<Vec<ConversationTurn>>(session.conversation_history)
                {
                    // Session history goes first; the caller's copy wins
                    // on the tail.
                    let mut merged = history;
                    merged.append(&mut state.conversation_history);
                    state.conversation_history = merged;
                }
            }
            Err(e) => warn!(session_id = %session.session_id, error = %e, "bad wizard payload"),
        }
    }

    /// Bound the history to the configured retention
    fn stitch_history(&self, state: &mut FlowState) {
        let limit = self.ctx.history_limit;
        let len = state.conversation_history.len();
        if len > limit {
            state.conversation_history.drain(..len - limit);
        }
    }
}

fn internal_error_output() -> FinalOutput {
    FinalOutput {
        action: "unknown".to_string(),
        status: OutputStatus::Error,
        success: false,
        message: "Something went wrong. Please retry.".to_string(),
        session_id: None,
        consequences: None,
        selection_type: None,
        options: None,
        suggestions: None,
        data: None,
        error: Some(ErrorInfo::new(ErrorKind::Internal, "internal error")),
    }
}
