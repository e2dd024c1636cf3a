//! Decision router: pure predicates over the flow state
//!
//! These back the conditional edges declared in the graph wiring. Every
//! function is a pure read of state; the edge declaration order in
//! `build_graph` decides precedence.

use crate::catalog::actions;
use crate::error::ErrorKind;
use crate::state::{FlowState, ResolveOutcome};
use crate::wizard::WizardFlow;

/// A wizard restored from its session owns this turn
pub fn wizard_active(state: &FlowState) -> bool {
    state.wizard.is_some()
}

/// The parsed action starts a wizard
///
/// `create_stop` with a name parameter is the exception: it executes
/// directly instead of walking the wizard.
pub fn wizard_entry(state: &FlowState) -> bool {
    if WizardFlow::for_action(&state.intent.action).is_none() {
        return false;
    }
    !(state.intent.action == actions::CREATE_STOP && state.param_str("name").is_some())
}

/// Page gating rewrote the action
pub fn context_mismatch(state: &FlowState) -> bool {
    state
        .error
        .as_ref()
        .map(|e| e.kind == ErrorKind::ContextMismatch)
        .unwrap_or(false)
}

/// Something already failed
pub fn failed(state: &FlowState) -> bool {
    state.error.is_some()
}

/// Nothing could be classified
pub fn unknown_action(state: &FlowState) -> bool {
    state.intent.action == actions::UNKNOWN
}

/// The user must pick before anything can run
pub fn needs_clarification(state: &FlowState) -> bool {
    state.needs_clarification
}

/// The resolver found several equally-plausible targets
pub fn ambiguous(state: &FlowState) -> bool {
    state.resolve_result == Some(ResolveOutcome::Ambiguous)
}

/// The resolver missed
pub fn not_found(state: &FlowState) -> bool {
    state.resolve_result == Some(ResolveOutcome::NotFound)
}

/// Execution is parked behind a confirmation
pub fn needs_confirmation(state: &FlowState) -> bool {
    state.needs_confirmation
}

/// A driver assignment without its driver goes through the provider
pub fn needs_driver_selection(state: &FlowState) -> bool {
    state.intent.action == actions::ASSIGN_DRIVER && state.param_i64("driver_id").is_none()
}

/// A vehicle assignment without its vehicle goes through the provider
pub fn needs_vehicle_selection(state: &FlowState) -> bool {
    state.intent.action == actions::ASSIGN_VEHICLE && state.param_i64("vehicle_id").is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wizard_entry_honours_direct_create_stop() {
        let mut state = FlowState::new(1, "create stop Odeon Circle");
        state.intent.action = actions::CREATE_STOP.to_string();
        state
            .intent
            .parameters
            .insert("name".to_string(), json!("Odeon Circle"));
        assert!(!wizard_entry(&state));

        let mut bare = FlowState::new(1, "create a stop");
        bare.intent.action = actions::CREATE_STOP.to_string();
        assert!(wizard_entry(&bare));
    }

    #[test]
    fn test_selection_predicates() {
        let mut state = FlowState::new(1, "assign driver");
        state.intent.action = actions::ASSIGN_DRIVER.to_string();
        assert!(needs_driver_selection(&state));
        state
            .intent
            .parameters
            .insert("driver_id".to_string(), json!(5));
        assert!(!needs_driver_selection(&state));
    }

    #[test]
    fn test_context_mismatch_predicate() {
        let mut state = FlowState::new(1, "x");
        assert!(!context_mismatch(&state));
        state.set_error(ErrorKind::ContextMismatch, "wrong page");
        assert!(context_mismatch(&state));
    }
}
