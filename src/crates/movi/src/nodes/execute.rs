//! The `execute_action` node
//!
//! Dispatches to the tool catalog. Carries two guards that exist purely
//! to catch regressions elsewhere in the graph: execution never proceeds
//! during a clarification, and a risky action with a session attached
//! requires that session to be CONFIRMED.

use std::sync::Arc;

use flow_session::SessionStatus;
use tracing::{info, warn};

use crate::context::AgentContext;
use crate::error::ErrorKind;
use crate::state::FlowState;
use crate::tools::ToolInvocation;

/// The `execute_action` node
pub async fn execute_action_node(
    ctx: Arc<AgentContext>,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    if state.needs_clarification || state.awaiting_selection {
        warn!("executor reached during clarification");
        state.set_error(
            ErrorKind::Internal,
            "cannot execute while a clarification is pending",
        );
        return Ok(state);
    }

    let action = state.intent.action.clone();
    if ctx.catalog.is_risky(&action) {
        if let Some(session_id) = state.pending_session_id {
            let confirmed = match ctx.sessions.get(session_id).await {
                Ok(Some(session)) => session.status == SessionStatus::Confirmed,
                Ok(None) => false,
                Err(e) => {
                    state.set_error(ErrorKind::Internal, e.to_string());
                    return Ok(state);
                }
            };
            if !confirmed {
                state.set_error(
                    ErrorKind::SessionNotPending,
                    "this action is waiting on a confirmation that has not been given",
                );
                return Ok(state);
            }
        }
    }

    let invocation = ToolInvocation {
        db: ctx.db.clone(),
        user_id: state.user_id,
        action: action.clone(),
        resolved: state.resolved.clone(),
        parameters: state.intent.parameters.clone(),
        drivers_have_status: ctx.drivers_have_status,
    };

    match ctx.tools.dispatch(invocation).await {
        Ok(result) => {
            info!(action = %action, "action executed");
            state.execution_result = Some(result);
        }
        Err(e) => {
            warn!(action = %action, error = %e, "tool failed");
            state.set_error(e.kind(), e.user_message());
        }
    }
    Ok(state)
}
