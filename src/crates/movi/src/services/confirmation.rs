//! Confirmation entry: apply or cancel a parked action
//!
//! Lives outside the graph. Loads the session, wins (or loses) the
//! compare-and-set on its status, and on confirm dispatches straight to
//! the executor with the snapshot taken when the action was parked.
//! The graph stages that already ran are not repeated.

use std::sync::Arc;

use flow_session::{SessionKind, SessionStatus};
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::AgentContext;
use crate::error::{ErrorInfo, ErrorKind};
use crate::state::{FinalOutput, OutputStatus, PendingAction};
use crate::tools::ToolInvocation;

/// The confirmation entry point
pub struct ConfirmationService {
    ctx: Arc<AgentContext>,
}

impl ConfirmationService {
    /// Build the service over a shared context
    pub fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }

    /// Apply (`confirmed = true`) or cancel a pending session
    pub async fn confirm(&self, session_id: Uuid, confirmed: bool, user_id: i64) -> FinalOutput {
        let session = match self.ctx.sessions.get(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                return error_output(
                    ErrorKind::SessionNotPending,
                    "That confirmation no longer exists. Please re-issue the command.",
                )
            }
            Err(e) => {
                warn!(error = %e, "session load failed");
                return error_output(ErrorKind::DatabaseError, "Please retry.");
            }
        };

        if session.user_id != user_id {
            return error_output(
                ErrorKind::SessionNotPending,
                "That confirmation belongs to a different user.",
            );
        }
        if session.kind != SessionKind::PendingConfirmation {
            return error_output(
                ErrorKind::SessionNotPending,
                "That session is not a pending confirmation.",
            );
        }
        if session.status != SessionStatus::Pending {
            return error_output(
                ErrorKind::SessionNotPending,
                "That action was already resolved. Please re-issue the command.",
            );
        }
        if session.is_expired() {
            // Best effort: the reaper will catch it anyway.
            if let Err(e) = self
                .ctx
                .sessions
                .transition(session_id, SessionStatus::Pending, SessionStatus::Expired)
                .await
            {
                warn!(error = %e, "failed to expire session");
            }
            return error_output(
                ErrorKind::SessionExpired,
                "That confirmation expired. Please re-issue the command.",
            );
        }

        let pending: PendingAction = match serde_json::from_value(session.payload.clone()) {
            Ok(pending) => pending,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "bad pending payload");
                return error_output(ErrorKind::Internal, "Please re-issue the command.");
            }
        };

        if !confirmed {
            return match self
                .ctx
                .sessions
                .transition(session_id, SessionStatus::Pending, SessionStatus::Cancelled)
                .await
            {
                Ok(_) => {
                    info!(session_id = %session_id, action = %pending.action, "action cancelled");
                    cancelled_output(&pending)
                }
                // CAS lost: someone else resolved it first.
                Err(_) => error_output(
                    ErrorKind::SessionNotPending,
                    "That action was already resolved by another request.",
                ),
            };
        }

        if self
            .ctx
            .sessions
            .transition(session_id, SessionStatus::Pending, SessionStatus::Confirmed)
            .await
            .is_err()
        {
            return error_output(
                ErrorKind::SessionNotPending,
                "That action was already resolved by another request.",
            );
        }

        let invocation = ToolInvocation {
            db: self.ctx.db.clone(),
            user_id,
            action: pending.action.clone(),
            resolved: pending.resolved.clone(),
            parameters: pending.parameters.clone(),
            drivers_have_status: self.ctx.drivers_have_status,
        };
        let result = self.ctx.tools.dispatch(invocation).await;

        // The session is DONE either way; the outcome travels in the
        // envelope, not the session status.
        if let Err(e) = self
            .ctx
            .sessions
            .transition(session_id, SessionStatus::Confirmed, SessionStatus::Done)
            .await
        {
            warn!(error = %e, "failed to close confirmed session");
        }

        match result {
            Ok(execution) => {
                info!(session_id = %session_id, action = %pending.action, "confirmed action executed");
                FinalOutput {
                    action: pending.action,
                    status: OutputStatus::Executed,
                    success: true,
                    message: execution.message,
                    session_id: None,
                    consequences: Some(pending.consequences),
                    selection_type: None,
                    options: None,
                    suggestions: None,
                    data: Some(execution.data),
                    error: None,
                }
            }
            Err(e) => FinalOutput {
                action: pending.action,
                status: OutputStatus::Error,
                success: false,
                message: e.user_message(),
                session_id: None,
                consequences: Some(pending.consequences),
                selection_type: None,
                options: None,
                suggestions: None,
                data: None,
                error: Some(ErrorInfo::new(e.kind(), e.user_message())),
            },
        }
    }
}

fn error_output(kind: ErrorKind, message: &str) -> FinalOutput {
    FinalOutput {
        action: "unknown".to_string(),
        status: OutputStatus::Error,
        success: false,
        message: message.to_string(),
        session_id: None,
        consequences: None,
        selection_type: None,
        options: None,
        suggestions: None,
        data: None,
        error: Some(ErrorInfo::new(kind, message)),
    }
}

fn cancelled_output(pending: &PendingAction) -> FinalOutput {
    FinalOutput {
        action: pending.action.clone(),
        status: OutputStatus::Cancelled,
        success: true,
        message: "Cancelled. Nothing was changed.".to_string(),
        session_id: None,
        consequences: None,
        selection_type: None,
        options: None,
        suggestions: None,
        data: None,
        error: None,
    }
}
