//! Selection providers: `driver_selection_provider` and
//! `vehicle_selection_provider`
//!
//! Each computes a filtered option list for the UI to render as buttons.
//! The picked option comes back as a structured command, which re-enters
//! the graph deterministically.

use std::sync::Arc;

use tracing::debug;

use crate::context::AgentContext;
use crate::db::models::Trip;
use crate::db::repositories::{
    DeploymentRepository, DriverRepository, TripRepository, VehicleRepository,
};
use crate::error::ErrorKind;
use crate::state::{ClarificationOption, FlowState, SelectionType};
use crate::timeutil;

async fn target_trip(ctx: &AgentContext, state: &mut FlowState) -> Option<Trip> {
    let trip_id = state.resolved_trip_id()?;
    match TripRepository::get_by_id(&ctx.db, trip_id).await {
        Ok(Some(trip)) => Some(trip),
        Ok(None) => {
            state.set_error(ErrorKind::TripNotFound, format!("trip {} not found", trip_id));
            None
        }
        Err(e) => {
            state.set_error(ErrorKind::DatabaseError, e.to_string());
            None
        }
    }
}

/// The `driver_selection_provider` node
///
/// Offers drivers whose shift covers the trip's time and who have no
/// other trip within the 90-minute window; drivers marked unavailable
/// are excluded.
pub async fn driver_selection_node(
    ctx: Arc<AgentContext>,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    let Some(trip) = target_trip(&ctx, &mut state).await else {
        return Ok(state);
    };

    let drivers = match DriverRepository::list_all(&ctx.db, ctx.drivers_have_status).await {
        Ok(drivers) => drivers,
        Err(e) => {
            state.set_error(ErrorKind::DatabaseError, e.to_string());
            return Ok(state);
        }
    };

    let mut options = Vec::new();
    for driver in drivers {
        if !driver.is_available() {
            debug!(driver = %driver.name, "excluded: marked unavailable");
            continue;
        }
        if !timeutil::shift_covers(&driver.shift_start, &driver.shift_end, &trip.scheduled_time) {
            debug!(driver = %driver.name, "excluded: shift does not cover trip time");
            continue;
        }
        let others = match DeploymentRepository::trips_for_driver_on_date(
            &ctx.db,
            driver.id,
            &trip.trip_date,
            Some(trip.id),
        )
        .await
        {
            Ok(others) => others,
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                return Ok(state);
            }
        };
        let conflicted = others
            .iter()
            .any(|t| timeutil::within_conflict_window(&t.scheduled_time, &trip.scheduled_time));
        if conflicted {
            debug!(driver = %driver.name, "excluded: trip within 90 minutes");
            continue;
        }
        options.push(ClarificationOption {
            id: driver.id.to_string(),
            label: driver.name.clone(),
            description: format!("shift {} - {}", driver.shift_start, driver.shift_end),
        });
    }

    state.awaiting_selection = true;
    state.selection_type = Some(SelectionType::Driver);
    state.clarification_options = options;
    state.reply = Some(if state.clarification_options.is_empty() {
        format!("No driver is available for {} right now.", trip.display_name)
    } else {
        format!("Select a driver for {}.", trip.display_name)
    });
    Ok(state)
}

/// The `vehicle_selection_provider` node
///
/// Offers vehicles that are neither in maintenance nor blocked and have
/// no deployment overlapping the trip's time window on its date.
pub async fn vehicle_selection_node(
    ctx: Arc<AgentContext>,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    let Some(trip) = target_trip(&ctx, &mut state).await else {
        return Ok(state);
    };

    let vehicles = match VehicleRepository::list_all(&ctx.db).await {
        Ok(vehicles) => vehicles,
        Err(e) => {
            state.set_error(ErrorKind::DatabaseError, e.to_string());
            return Ok(state);
        }
    };

    let mut options = Vec::new();
    for vehicle in vehicles {
        if !vehicle.is_deployable() {
            continue;
        }
        let others = match DeploymentRepository::trips_for_vehicle_on_date(
            &ctx.db,
            vehicle.id,
            &trip.trip_date,
            Some(trip.id),
        )
        .await
        {
            Ok(others) => others,
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                return Ok(state);
            }
        };
        let conflicted = others
            .iter()
            .any(|t| timeutil::within_conflict_window(&t.scheduled_time, &trip.scheduled_time));
        if conflicted {
            continue;
        }
        options.push(ClarificationOption {
            id: vehicle.id.to_string(),
            label: vehicle.registration_number.clone(),
            description: format!("capacity {}", vehicle.capacity),
        });
    }

    state.awaiting_selection = true;
    state.selection_type = Some(SelectionType::Vehicle);
    state.clarification_options = options;
    state.reply = Some(if state.clarification_options.is_empty() {
        format!("No vehicle is free for {} right now.", trip.display_name)
    } else {
        format!("Select a vehicle for {}.", trip.display_name)
    });
    Ok(state)
}
