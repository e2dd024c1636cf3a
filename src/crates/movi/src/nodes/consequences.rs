//! Consequence analysis: the `check_consequences` node
//!
//! Computes the impact of a proposed mutation and decides whether to park
//! it behind a confirmation session. Safe actions pass straight through.
//! No domain row is touched here; the only write is the session record.

use std::sync::Arc;

use flow_session::{Session, SessionKind};
use serde_json::json;
use tracing::{info, warn};

use crate::catalog::actions;
use crate::context::AgentContext;
use crate::db::models::Trip;
use crate::db::repositories::{
    BookingRepository, DeploymentRepository, NetworkRepository, TripRepository,
};
use crate::db::DatabasePool;
use crate::error::{ErrorKind, Result};
use crate::state::{Consequences, EntityType, FlowState, PendingAction};
use crate::timeutil;

/// Compute the consequences snapshot for a trip target
pub async fn compute_for_trip(db: &DatabasePool, trip: &Trip) -> Result<Consequences> {
    let booking_count = BookingRepository::active_count(db, trip.id).await?;
    let booking_percentage = if trip.capacity > 0 {
        (booking_count as f64 / trip.capacity as f64) * 100.0
    } else {
        0.0
    };
    let deployment = DeploymentRepository::for_trip(db, trip.id).await?;
    // Both slots count, not just the vehicle one. An orphan row with
    // neither slot filled is not a deployment; assigning into it reuses
    // the row.
    let has_deployment = deployment
        .as_ref()
        .map(|d| d.vehicle_id.is_some() || d.driver_id.is_some())
        .unwrap_or(false);

    Ok(Consequences {
        booking_count,
        booking_percentage,
        has_deployment,
        live_status: Some(trip.live_status.clone()),
        downstream: 0,
    })
}

/// Whether the decision rule blocks this action on this snapshot
pub fn requires_confirmation(action: &str, consequences: &Consequences) -> bool {
    match action {
        actions::CANCEL_TRIP
        | actions::REMOVE_VEHICLE
        | actions::REMOVE_DRIVER
        | actions::UPDATE_TRIP_TIME
        | actions::UPDATE_TRIP_STATUS
        | actions::DELAY_TRIP
        | actions::RESCHEDULE_TRIP
        | actions::CANCEL_ALL_BOOKINGS => {
            consequences.booking_count > 0
                || consequences.live_status.as_deref() == Some("IN_PROGRESS")
        }
        // Both the vehicle slot and the bare deployment row must count; a
        // deployment row alone has historically been missed.
        actions::ASSIGN_VEHICLE => consequences.has_deployment,
        actions::DELETE_STOP
        | actions::DELETE_PATH
        | actions::DELETE_ROUTE
        | actions::UPDATE_PATH_STOPS => consequences.downstream > 0,
        actions::BLOCK_VEHICLE
        | actions::UNBLOCK_VEHICLE
        | actions::SET_DRIVER_AVAILABILITY => consequences.downstream > 0,
        _ => false,
    }
}

/// The `check_consequences` node
pub async fn check_consequences_node(
    ctx: Arc<AgentContext>,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    let action = state.intent.action.clone();
    if !ctx.catalog.is_risky(&action) {
        return Ok(state);
    }

    // An assignment with no vehicle chosen yet goes to the selection
    // provider first; consequences are checked when the pick comes back.
    if action == actions::ASSIGN_VEHICLE && state.param_i64("vehicle_id").is_none() {
        return Ok(state);
    }

    let snapshot = match compute(&ctx, &mut state).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return Ok(state),
        Err(e) => {
            state.set_error(e.kind(), e.user_message());
            return Ok(state);
        }
    };
    state.consequences = Some(snapshot.clone());

    // Vehicle availability is a hard error, not a confirmation.
    if action == actions::ASSIGN_VEHICLE {
        if let Err(e) = check_vehicle_availability(&ctx, &mut state).await {
            state.set_error(e.kind(), e.user_message());
            return Ok(state);
        }
        if state.error.is_some() {
            return Ok(state);
        }
    }

    if !requires_confirmation(&action, &snapshot) {
        return Ok(state);
    }

    let pending = PendingAction {
        action: action.clone(),
        parameters: state.intent.parameters.clone(),
        resolved: state.resolved.clone(),
        consequences: snapshot.clone(),
    };
    let session = Session::new(
        state.user_id,
        SessionKind::PendingConfirmation,
        match serde_json::to_value(&pending) {
            Ok(value) => value,
            Err(e) => {
                state.set_error(ErrorKind::Internal, e.to_string());
                return Ok(state);
            }
        },
    )
    .with_conversation_history(json!(state.conversation_history));

    match ctx.sessions.create(session).await {
        Ok(session) => {
            info!(action = %action, session_id = %session.session_id, "confirmation required");
            state.pending_session_id = Some(session.session_id);
            state.needs_confirmation = true;
            state.reply = Some(confirmation_message(&action, &snapshot, &state));
        }
        Err(e) => {
            warn!(error = %e, "failed to create confirmation session");
            state.set_error(ErrorKind::Internal, "could not create a confirmation session");
        }
    }
    Ok(state)
}

/// Compute the snapshot for whatever entity was resolved
///
/// Returns `Ok(None)` when there is nothing to compute (no resolved
/// target, e.g. a risky action that slipped through without one).
async fn compute(ctx: &AgentContext, state: &mut FlowState) -> Result<Option<Consequences>> {
    let Some(resolved) = state.resolved.clone() else {
        return Ok(None);
    };
    let snapshot = match resolved.entity_type {
        EntityType::Trip => {
            let Some(trip) = TripRepository::get_by_id(&ctx.db, resolved.entity_id).await? else {
                return Ok(None);
            };
            compute_for_trip(&ctx.db, &trip).await?
        }
        EntityType::Stop => Consequences {
            downstream: NetworkRepository::paths_using_stop(&ctx.db, resolved.entity_id).await?,
            ..Consequences::default()
        },
        EntityType::Path => Consequences {
            downstream: NetworkRepository::routes_using_path(&ctx.db, resolved.entity_id)
                .await?
                .len() as i64,
            ..Consequences::default()
        },
        EntityType::Route => Consequences {
            downstream: TripRepository::count_for_route(&ctx.db, resolved.entity_id).await?,
            ..Consequences::default()
        },
        EntityType::Vehicle => Consequences {
            downstream: DeploymentRepository::vehicle_deployment_count(
                &ctx.db,
                resolved.entity_id,
                &crate::db::repositories::today(),
            )
            .await?,
            ..Consequences::default()
        },
        EntityType::Driver => Consequences {
            downstream: DeploymentRepository::trips_for_driver_on_date(
                &ctx.db,
                resolved.entity_id,
                &crate::db::repositories::today(),
                None,
            )
            .await?
            .len() as i64,
            ..Consequences::default()
        },
    };
    Ok(Some(snapshot))
}

/// Reject an assignment whose vehicle is busy on the same date and time
/// window
async fn check_vehicle_availability(ctx: &AgentContext, state: &mut FlowState) -> Result<()> {
    let Some(vehicle_id) = state.param_i64("vehicle_id") else {
        return Ok(());
    };
    let Some(trip_id) = state.resolved_trip_id() else {
        return Ok(());
    };
    let Some(trip) = TripRepository::get_by_id(&ctx.db, trip_id).await? else {
        return Ok(());
    };

    let others = DeploymentRepository::trips_for_vehicle_on_date(
        &ctx.db,
        vehicle_id,
        &trip.trip_date,
        Some(trip.id),
    )
    .await?;
    let conflicting: Vec<i64> = others
        .iter()
        .filter(|other| {
            timeutil::within_conflict_window(&other.scheduled_time, &trip.scheduled_time)
        })
        .map(|other| other.id)
        .collect();
    if !conflicting.is_empty() {
        state.set_error(
            ErrorKind::VehicleConflict,
            format!(
                "that vehicle is already deployed to trip(s) {:?} on {}",
                conflicting, trip.trip_date
            ),
        );
    }
    Ok(())
}

fn confirmation_message(action: &str, snapshot: &Consequences, state: &FlowState) -> String {
    let target = state
        .resolved
        .as_ref()
        .map(|r| r.label.clone())
        .unwrap_or_else(|| "the target".to_string());
    match action {
        actions::ASSIGN_VEHICLE => format!(
            "{} already has a deployment. Replace it?",
            target
        ),
        actions::DELETE_STOP | actions::DELETE_PATH | actions::DELETE_ROUTE
        | actions::UPDATE_PATH_STOPS => format!(
            "{} has {} dependent configuration item(s). Proceed anyway?",
            target, snapshot.downstream
        ),
        actions::BLOCK_VEHICLE | actions::UNBLOCK_VEHICLE | actions::SET_DRIVER_AVAILABILITY => {
            format!(
                "{} is involved in {} trip(s) today. Proceed anyway?",
                target, snapshot.downstream
            )
        }
        _ => format!(
            "This will affect {} active booking(s) ({:.0}% of capacity) on {}. Confirm to proceed.",
            snapshot.booking_count, snapshot.booking_percentage, target
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(bookings: i64, status: &str, deployed: bool, downstream: i64) -> Consequences {
        Consequences {
            booking_count: bookings,
            booking_percentage: 0.0,
            has_deployment: deployed,
            live_status: Some(status.to_string()),
            downstream,
        }
    }

    #[test]
    fn test_cancel_blocks_on_bookings() {
        assert!(requires_confirmation(actions::CANCEL_TRIP, &snapshot(8, "SCHEDULED", false, 0)));
        assert!(!requires_confirmation(actions::CANCEL_TRIP, &snapshot(0, "SCHEDULED", false, 0)));
    }

    #[test]
    fn test_cancel_blocks_on_in_progress() {
        assert!(requires_confirmation(actions::CANCEL_TRIP, &snapshot(0, "IN_PROGRESS", false, 0)));
    }

    #[test]
    fn test_assign_vehicle_blocks_on_existing_deployment() {
        assert!(requires_confirmation(actions::ASSIGN_VEHICLE, &snapshot(0, "SCHEDULED", true, 0)));
        assert!(!requires_confirmation(actions::ASSIGN_VEHICLE, &snapshot(5, "SCHEDULED", false, 0)));
    }

    #[test]
    fn test_deletes_block_on_downstream() {
        assert!(requires_confirmation(actions::DELETE_PATH, &snapshot(0, "SCHEDULED", false, 2)));
        assert!(!requires_confirmation(actions::DELETE_PATH, &snapshot(0, "SCHEDULED", false, 0)));
    }

    #[test]
    fn test_safe_actions_never_block() {
        assert!(!requires_confirmation(actions::ASSIGN_DRIVER, &snapshot(9, "IN_PROGRESS", true, 9)));
        assert!(!requires_confirmation(actions::GET_TRIP_STATUS, &snapshot(9, "IN_PROGRESS", true, 9)));
    }
}
