//! The `wizard_step` node
//!
//! Drives the four guided creation flows. On first entry it creates the
//! wizard session and prompts for the first step; on each later turn it
//! validates the user's input under the current step, re-prompting or
//! advancing, and commits through the owning action's tool once every
//! step is satisfied. Wizard state survives request boundaries in the
//! session store.

use std::sync::Arc;

use flow_session::{Session, SessionKind, SessionStatus};
use serde_json::json;
use tracing::{info, warn};

use crate::context::AgentContext;
use crate::db::repositories::{today, NetworkRepository, VehicleRepository};
use crate::error::ErrorKind;
use crate::state::{ClarificationOption, FlowState};
use crate::tools::ToolInvocation;
use crate::wizard::{self, OptionSource, WizardFlow, WizardState};

/// The `wizard_step` node
pub async fn wizard_step_node(
    ctx: Arc<AgentContext>,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    match state.wizard.take() {
        None => start_wizard(&ctx, state).await,
        Some(wizard) => advance_wizard(&ctx, state, wizard).await,
    }
}

async fn start_wizard(
    ctx: &AgentContext,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    let Some(flow) = WizardFlow::for_action(&state.intent.action) else {
        state.set_error(
            ErrorKind::Internal,
            format!("'{}' does not own a wizard", state.intent.action),
        );
        return Ok(state);
    };

    let wizard = WizardState::new(flow);
    let payload = match serde_json::to_value(&wizard) {
        Ok(value) => value,
        Err(e) => {
            state.set_error(ErrorKind::Internal, e.to_string());
            return Ok(state);
        }
    };
    let session = Session::new(state.user_id, SessionKind::Wizard, payload)
        .with_conversation_history(json!(state.conversation_history));

    match ctx.sessions.create(session).await {
        Ok(session) => {
            info!(flow = flow.as_str(), session_id = %session.session_id, "wizard started");
            state.wizard_session_id = Some(session.session_id);
        }
        Err(e) => {
            warn!(error = %e, "failed to create wizard session");
            state.set_error(ErrorKind::Internal, "could not start the wizard");
            return Ok(state);
        }
    }

    prompt_current_step(ctx, &mut state, &wizard).await;
    state.wizard = Some(wizard);
    Ok(state)
}

async fn advance_wizard(
    ctx: &AgentContext,
    mut state: FlowState,
    mut wizard: WizardState,
) -> flow_core::Result<FlowState> {
    let input = state.input_text.clone();

    if wizard::is_cancel_word(&input) {
        wizard.cancelled = true;
        if let Some(session_id) = state.wizard_session_id {
            if let Err(e) = ctx
                .sessions
                .transition(session_id, SessionStatus::Pending, SessionStatus::Cancelled)
                .await
            {
                warn!(error = %e, "failed to cancel wizard session");
            }
        }
        state.reply = Some("Wizard cancelled. Nothing was created.".to_string());
        state.wizard = Some(wizard);
        return Ok(state);
    }

    let Some(step) = wizard.step() else {
        // A complete wizard commits before it is ever persisted.
        state.set_error(ErrorKind::Internal, "wizard has no current step");
        state.wizard = Some(wizard);
        return Ok(state);
    };

    match wizard::validate_step(wizard.flow, step.key, &input) {
        Err(message) => {
            state.reply = Some(message);
            prompt_options(ctx, &mut state, step.options).await;
            state.wizard = Some(wizard);
            Ok(state)
        }
        Ok(value) => {
            wizard.collected.insert(step.key.to_string(), value);
            wizard.current_step += 1;

            if wizard.is_complete() {
                return commit_wizard(ctx, state, wizard).await;
            }

            prompt_current_step(ctx, &mut state, &wizard).await;
            persist_progress(ctx, &mut state, &wizard).await;
            state.wizard = Some(wizard);
            Ok(state)
        }
    }
}

async fn commit_wizard(
    ctx: &AgentContext,
    mut state: FlowState,
    wizard: WizardState,
) -> flow_core::Result<FlowState> {
    let action = wizard.flow.owning_action();
    let mut parameters = wizard.collected.clone();
    parameters.remove("confirm");
    if wizard.flow == WizardFlow::TripCreation && !parameters.contains_key("date") {
        parameters.insert("date".to_string(), json!(today()));
    }

    let invocation = ToolInvocation {
        db: ctx.db.clone(),
        user_id: state.user_id,
        action: action.to_string(),
        resolved: None,
        parameters,
        drivers_have_status: ctx.drivers_have_status,
    };

    // The wizard's session is consumed regardless of the tool's outcome;
    // the user starts a fresh wizard to retry.
    if let Some(session_id) = state.wizard_session_id.take() {
        let confirmed = ctx
            .sessions
            .transition(session_id, SessionStatus::Pending, SessionStatus::Confirmed)
            .await;
        match confirmed {
            Ok(_) => {
                if let Err(e) = ctx
                    .sessions
                    .transition(session_id, SessionStatus::Confirmed, SessionStatus::Done)
                    .await
                {
                    warn!(error = %e, "failed to close wizard session");
                }
            }
            Err(e) => warn!(error = %e, "failed to confirm wizard session"),
        }
    }

    match ctx.tools.dispatch(invocation).await {
        Ok(result) => {
            info!(flow = wizard.flow.as_str(), "wizard committed");
            state.execution_result = Some(result);
            state.wizard = None;
        }
        Err(e) => {
            state.set_error(e.kind(), e.user_message());
            state.wizard = None;
        }
    }
    Ok(state)
}

async fn persist_progress(ctx: &AgentContext, state: &mut FlowState, wizard: &WizardState) {
    let Some(session_id) = state.wizard_session_id else {
        return;
    };
    let payload = match serde_json::to_value(wizard) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "failed to serialise wizard state");
            return;
        }
    };
    if let Err(e) = ctx
        .sessions
        .update_payload(session_id, payload, json!(state.conversation_history))
        .await
    {
        warn!(error = %e, "failed to persist wizard progress");
    }
}

async fn prompt_current_step(ctx: &AgentContext, state: &mut FlowState, wizard: &WizardState) {
    if let Some(step) = wizard.step() {
        state.reply = Some(step.prompt.to_string());
        prompt_options(ctx, state, step.options).await;
    }
}

/// Fill the option list backing the current step's UI buttons
async fn prompt_options(ctx: &AgentContext, state: &mut FlowState, source: OptionSource) {
    state.clarification_options.clear();
    let options = match source {
        OptionSource::None => return,
        OptionSource::Routes => NetworkRepository::list_routes(&ctx.db).await.map(|routes| {
            routes
                .into_iter()
                .map(|r| ClarificationOption {
                    id: r.id.to_string(),
                    label: r.route_name,
                    description: r.shift_time.unwrap_or_default(),
                })
                .collect()
        }),
        OptionSource::Paths => NetworkRepository::list_paths(&ctx.db).await.map(|paths| {
            paths
                .into_iter()
                .map(|p| ClarificationOption {
                    id: p.id.to_string(),
                    label: p.path_name,
                    description: "path".to_string(),
                })
                .collect()
        }),
        OptionSource::Stops => NetworkRepository::list_stops(&ctx.db).await.map(|stops| {
            stops
                .into_iter()
                .map(|s| ClarificationOption {
                    id: s.id.to_string(),
                    label: s.name,
                    description: format!("({:.4}, {:.4})", s.latitude, s.longitude),
                })
                .collect()
        }),
        OptionSource::Vehicles => VehicleRepository::unassigned_on_date(&ctx.db, &today())
            .await
            .map(|vehicles| {
                vehicles
                    .into_iter()
                    .map(|v| ClarificationOption {
                        id: v.id.to_string(),
                        label: v.registration_number,
                        description: format!("capacity {}", v.capacity),
                    })
                    .collect()
            }),
        OptionSource::Drivers => {
            crate::db::repositories::DriverRepository::list_all(&ctx.db, ctx.drivers_have_status)
                .await
                .map(|drivers| {
                    drivers
                        .into_iter()
                        .filter(|d| d.is_available())
                        .map(|d| ClarificationOption {
                            id: d.id.to_string(),
                            label: d.name,
                            description: format!("shift {} - {}", d.shift_start, d.shift_end),
                        })
                        .collect()
                })
        }
    };
    match options {
        Ok(options) => state.clarification_options = options,
        Err(e) => warn!(error = %e, "failed to load wizard options"),
    }
}
