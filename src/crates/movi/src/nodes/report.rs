//! The `report_result` node: the result formatter
//!
//! Normalises the terminal state into the response envelope, exactly
//! once per run. Payloads already carrying a `{type, data}` shape pass
//! through unchanged; wrapping them again breaks the UI.

use std::sync::Arc;

use flow_core::END;

use crate::context::AgentContext;
use crate::state::{FlowState, FinalOutput, OutputStatus};

/// The `report_result` node
pub async fn report_result_node(
    _ctx: Arc<AgentContext>,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    let status = derive_status(&state);
    let success = status != OutputStatus::Error;

    let message = match status {
        OutputStatus::Error => state
            .error
            .as_ref()
            .map(|e| e.message.clone())
            .or_else(|| state.reply.clone())
            .unwrap_or_else(|| "Something went wrong.".to_string()),
        _ => state
            .reply
            .clone()
            .or_else(|| state.execution_result.as_ref().map(|r| r.message.clone()))
            .unwrap_or_else(|| "Done.".to_string()),
    };

    // The session handle is surfaced exactly while the flow is waiting
    // on the user's next turn.
    let session_id = match status {
        OutputStatus::AwaitingConfirmation => state.pending_session_id,
        OutputStatus::AwaitingClarification => {
            state.pending_session_id.or(state.wizard_session_id)
        }
        _ => None,
    };

    let options = if state.clarification_options.is_empty() {
        None
    } else {
        Some(state.clarification_options.clone())
    };
    let suggestions = if state.suggestions.is_empty() {
        None
    } else {
        Some(state.suggestions.clone())
    };

    state.final_output = Some(FinalOutput {
        action: state.intent.action.clone(),
        status,
        success,
        message,
        session_id,
        consequences: state.consequences.clone(),
        selection_type: state.selection_type,
        options,
        suggestions,
        data: state.execution_result.as_ref().map(|r| r.data.clone()),
        error: state.error.clone(),
    });
    state.next_node = Some(END.to_string());
    Ok(state)
}

fn derive_status(state: &FlowState) -> OutputStatus {
    if state
        .wizard
        .as_ref()
        .map(|w| w.cancelled)
        .unwrap_or(false)
    {
        return OutputStatus::Cancelled;
    }
    if state.error.is_some() {
        return OutputStatus::Error;
    }
    if state.needs_confirmation {
        return OutputStatus::AwaitingConfirmation;
    }
    if state.awaiting_selection || state.needs_clarification || state.wizard.is_some() {
        return OutputStatus::AwaitingClarification;
    }
    OutputStatus::Executed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::state::ExecutionResult;
    use crate::wizard::{WizardFlow, WizardState};
    use serde_json::json;

    #[test]
    fn test_status_precedence() {
        let mut state = FlowState::new(1, "x");
        state.execution_result = Some(ExecutionResult {
            message: "ok".to_string(),
            data: json!({"type": "object", "data": {}}),
        });
        assert_eq!(derive_status(&state), OutputStatus::Executed);

        state.needs_clarification = true;
        assert_eq!(derive_status(&state), OutputStatus::AwaitingClarification);

        state.needs_confirmation = true;
        assert_eq!(derive_status(&state), OutputStatus::AwaitingConfirmation);

        state.set_error(ErrorKind::Internal, "boom");
        assert_eq!(derive_status(&state), OutputStatus::Error);

        let mut wizard = WizardState::new(WizardFlow::StopCreation);
        wizard.cancelled = true;
        state.wizard = Some(wizard);
        assert_eq!(derive_status(&state), OutputStatus::Cancelled);
    }

    #[test]
    fn test_wizard_midflight_is_awaiting_clarification() {
        let mut state = FlowState::new(1, "x");
        state.wizard = Some(WizardState::new(WizardFlow::TripCreation));
        assert_eq!(derive_status(&state), OutputStatus::AwaitingClarification);
    }
}
