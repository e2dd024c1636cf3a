//! Meta tools: previews and help

use serde_json::json;

use crate::db::repositories::TripRepository;
use crate::error::{AgentError, ErrorKind, Result};
use crate::nodes::consequences;
use crate::state::ExecutionResult;
use crate::tools::{payload, ToolInvocation};

/// Read-only preview: what would happen if an action ran against a trip
///
/// Reuses the consequence checker against the hypothetical action without
/// creating a session or touching the domain tables.
pub async fn simulate_action(inv: ToolInvocation) -> Result<ExecutionResult> {
    let action = inv.require_str("action")?.to_string();
    let trip_id = inv.trip_id()?;
    let trip = TripRepository::get_by_id(&inv.db, trip_id)
        .await?
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::TripNotFound, format!("trip {} not found", trip_id))
        })?;

    let snapshot = consequences::compute_for_trip(&inv.db, &trip).await?;
    let would_block = consequences::requires_confirmation(&action, &snapshot);

    Ok(ExecutionResult {
        message: if would_block {
            format!(
                "'{}' on {} would require confirmation ({} booking(s) affected)",
                action, trip.display_name, snapshot.booking_count
            )
        } else {
            format!("'{}' on {} would execute immediately", action, trip.display_name)
        },
        data: payload::object(&json!({
            "action": action,
            "trip": trip,
            "consequences": snapshot,
            "would_require_confirmation": would_block,
        })),
    })
}

/// Explain how the agent decides to block or execute
pub async fn explain_decision(_inv: ToolInvocation) -> Result<ExecutionResult> {
    let text = "Actions are classified safe or risky. Safe actions (queries, additive \
                creations, driver assignment) run immediately. Risky actions (cancelling \
                trips, removing vehicles or drivers, changing times, deleting stops, paths \
                or routes) first compute their consequences: affected bookings, current \
                deployment, downstream configuration. When bookings would be lost or the \
                trip is in progress, the agent parks the action in a pending session and \
                asks you to confirm before anything is written.";
    Ok(ExecutionResult {
        message: "How decisions are made".to_string(),
        data: payload::help(text),
    })
}

/// How to create a new route
pub async fn create_new_route_help(_inv: ToolInvocation) -> Result<ExecutionResult> {
    let text = "To create a route, open the manageRoute page and say 'create a new route'. \
                The wizard collects a name, the path to follow, a shift time and a \
                direction. If the path you need does not exist yet, create it first with \
                'create a new path' (a path is an ordered list of at least two stops).";
    Ok(ExecutionResult {
        message: "Creating a route".to_string(),
        data: payload::help(text),
    })
}
