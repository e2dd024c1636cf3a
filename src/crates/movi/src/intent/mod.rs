//! Intent parsing: the `parse_intent` node
//!
//! Ordered strategies, first hit wins:
//!
//! 1. Structured-command fast path (`STRUCTURED_CMD:` prefix) - no model
//!    call, confidence 1.0
//! 2. Model-driven parse with normalisation (synonyms, similarity)
//! 3. Regex fallback when the model path is exhausted
//!
//! Afterwards the parser applies page gating and decides whether the
//! request needs clarification before anything else may run.

mod model_parse;
mod patterns;
mod prompt;
mod similarity;
pub mod structured;

pub use similarity::similarity;
pub use structured::STRUCTURED_PREFIX;

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::TargetKind;
use crate::context::AgentContext;
use crate::error::ErrorKind;
use crate::state::FlowState;
use crate::wizard::WizardFlow;

/// Confidence below which the parser asks for clarification
const CLARIFICATION_THRESHOLD: f32 = 0.30;

/// The `parse_intent` node
pub async fn parse_intent_node(
    ctx: Arc<AgentContext>,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    // A wizard turn is not re-classified: the input belongs to the
    // current step, and the wizard node owns cancel detection.
    if let Some(wizard) = &state.wizard {
        state.intent.action = wizard.flow.owning_action().to_string();
        state.intent.confidence = 1.0;
        return Ok(state);
    }

    let text = state.input_text.trim().to_string();

    // Broken UI payloads interpolate the literal string "undefined".
    if text.contains("undefined") {
        state.intent.action = "unknown".to_string();
        state.set_error(
            ErrorKind::InvalidSelection,
            "Please select a valid option and try again.",
        );
        return Ok(state);
    }

    if let Some(rest) = text.strip_prefix(STRUCTURED_PREFIX) {
        match structured::parse(rest, &ctx.catalog) {
            Ok(intent) => {
                debug!(action = %intent.action, "structured command parsed");
                state.intent = intent;
            }
            Err(err) => {
                state.intent.action = "unknown".to_string();
                state.set_error(err.kind(), err.user_message());
                return Ok(state);
            }
        }
    } else {
        match model_parse::parse_with_model(
            ctx.model.as_ref(),
            &ctx.catalog,
            &state,
            ctx.history_limit,
        )
        .await
        {
            model_parse::ModelParse::Parsed(intent) => {
                info!(action = %intent.action, confidence = intent.confidence, "model parse");
                state.intent = intent;
            }
            model_parse::ModelParse::Unavailable => {
                info!("model path exhausted, using regex fallback");
                state.intent = patterns::fallback_parse(&text);
            }
        }
    }

    apply_page_gating(&ctx, &mut state);
    if state.error.is_none() {
        detect_clarification(&ctx, &mut state);
    }
    Ok(state)
}

/// Rewrite to `context_mismatch` when the action's page requirement
/// disagrees with the caller's page. Skipped entirely when the caller
/// supplied no page.
fn apply_page_gating(ctx: &AgentContext, state: &mut FlowState) {
    let Some(spec) = ctx.catalog.get(&state.intent.action) else {
        return;
    };
    if spec.page.allows(state.page) {
        return;
    }
    let required = spec.page.required_page_name();
    let message = format!(
        "'{}' is available on the {} page. Please switch to {} and try again.",
        state.intent.action, required, required
    );
    state.intent.action = "context_mismatch".to_string();
    state.set_error(ErrorKind::ContextMismatch, message.clone());
    state.reply = Some(message);
}

/// Decide whether the request can proceed without another user turn
fn detect_clarification(ctx: &AgentContext, state: &mut FlowState) {
    let action = state.intent.action.clone();
    let Some(spec) = ctx.catalog.get(&action) else {
        return;
    };
    if action == "unknown" || action == "context_mismatch" {
        return;
    }
    // Wizard-owning actions collect their parameters step by step.
    if WizardFlow::for_action(&action).is_some() {
        return;
    }

    // Structured commands are deterministic; only the model path can be
    // uncertain.
    if state.intent.confidence < CLARIFICATION_THRESHOLD && !state.input_text.starts_with(STRUCTURED_PREFIX) {
        state.needs_clarification = true;
        state.reply = Some(format!(
            "I think you want '{}', but I'm not confident. Could you rephrase?",
            action
        ));
        return;
    }

    if spec.target != TargetKind::None && !has_target_hint(state, spec.target) {
        state.needs_clarification = true;
        state.reply = Some(match spec.target {
            TargetKind::Trip => "Which trip do you mean? Give its name or pick it in the UI.".to_string(),
            TargetKind::Vehicle => "Which vehicle do you mean?".to_string(),
            TargetKind::Driver => "Which driver do you mean?".to_string(),
            TargetKind::Stop => "Which stop do you mean?".to_string(),
            TargetKind::Path => "Which path do you mean?".to_string(),
            TargetKind::Route => "Which route do you mean?".to_string(),
            TargetKind::None => unreachable!(),
        });
    }
}

/// Whether any resolve-ladder rung has something to work with
fn has_target_hint(state: &FlowState, target: TargetKind) -> bool {
    if state.intent.target_label.is_some() || state.intent.target_trip_id.is_some() {
        return true;
    }
    match target {
        TargetKind::Trip => {
            state.selected_trip_id.is_some()
                || state.param_i64("trip_id").is_some()
                // Vague references ("this trip") resolve through the text
                // extraction rung even without an explicit label.
                || state.param_str("target").is_some()
        }
        TargetKind::Route => {
            state.selected_route_id.is_some() || state.param_i64("route_id").is_some()
        }
        TargetKind::Vehicle => {
            state.param_i64("vehicle_id").is_some()
                || state.param_str("registration_number").is_some()
        }
        TargetKind::Driver => {
            state.param_i64("driver_id").is_some() || state.param_str("name").is_some()
        }
        TargetKind::Stop => {
            state.param_i64("stop_id").is_some() || state.param_str("name").is_some()
        }
        TargetKind::Path => {
            state.param_i64("path_id").is_some() || state.param_str("name").is_some()
        }
        TargetKind::None => true,
    }
}
