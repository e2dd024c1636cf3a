//! The `fallback` node
//!
//! Reached when the parser could not classify the input, the resolver
//! missed, or a node failed outright. Produces a helpful, action-agnostic
//! message with suggestions the formatter surfaces.

use std::sync::Arc;

use crate::context::AgentContext;
use crate::error::ErrorKind;
use crate::state::FlowState;

/// The `fallback` node
pub async fn fallback_node(
    _ctx: Arc<AgentContext>,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    match &state.error {
        Some(info) => match info.kind {
            ErrorKind::TripNotFound
            | ErrorKind::RouteNotFound
            | ErrorKind::StopNotFound
            | ErrorKind::PathNotFound
            | ErrorKind::VehicleNotFound
            | ErrorKind::DriverNotFound => {
                state.reply = Some(info.message.clone());
                state.suggestions = vec![
                    "Use the exact display name, e.g. 'Path-3 - 07:30'".to_string(),
                    "Say 'list all stops', 'list all routes' or 'get today summary' to browse"
                        .to_string(),
                ];
            }
            _ => {
                state.reply = Some(info.message.clone());
            }
        },
        None => {
            state.set_error(
                ErrorKind::UnknownAction,
                "I didn't understand that request.",
            );
            state.reply = Some(
                "I didn't understand that. I can manage trips, vehicles, drivers, bookings \
                 and the stop/path/route network."
                    .to_string(),
            );
            state.suggestions = vec![
                "Cancel Path-3 - 07:30".to_string(),
                "Assign a driver to this trip".to_string(),
                "List all stops".to_string(),
                "Get today summary".to_string(),
            ];
        }
    }
    Ok(state)
}
