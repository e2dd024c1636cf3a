//! Trip tools

use regex::Regex;
use serde_json::json;
use tracing::info;

use crate::db::models::Trip;
use crate::db::repositories::{
    today, AuditRepository, BookingRepository, DeploymentRepository, DriverRepository,
    NetworkRepository, TripRepository, VehicleRepository,
};
use crate::error::{AgentError, ErrorKind, Result};
use crate::state::ExecutionResult;
use crate::timeutil;
use crate::tools::{payload, ToolInvocation};

async fn load_trip(inv: &ToolInvocation) -> Result<Trip> {
    let trip_id = inv.trip_id()?;
    TripRepository::get_by_id(&inv.db, trip_id)
        .await?
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::TripNotFound, format!("trip {} not found", trip_id))
        })
}

/// Assign a vehicle to a trip
///
/// Re-checks availability even when the graph already did: structured
/// commands and confirmed sessions reach this handler directly.
pub async fn assign_vehicle(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip = load_trip(&inv).await?;
    let vehicle_id = inv.require_i64("vehicle_id")?;

    let vehicle = VehicleRepository::get_by_id(&inv.db, vehicle_id)
        .await?
        .ok_or_else(|| {
            AgentError::domain(
                ErrorKind::VehicleNotFound,
                format!("vehicle {} not found", vehicle_id),
            )
        })?;
    if !vehicle.is_deployable() {
        return Err(AgentError::domain(
            ErrorKind::VehicleConflict,
            format!("{} is {}", vehicle.registration_number, vehicle.status),
        ));
    }

    let conflicts = DeploymentRepository::trips_for_vehicle_on_date(
        &inv.db,
        vehicle_id,
        &trip.trip_date,
        Some(trip.id),
    )
    .await?;
    let overlapping: Vec<i64> = conflicts
        .iter()
        .filter(|other| timeutil::within_conflict_window(&other.scheduled_time, &trip.scheduled_time))
        .map(|other| other.id)
        .collect();
    if !overlapping.is_empty() {
        return Err(AgentError::domain(
            ErrorKind::VehicleConflict,
            format!(
                "{} is already deployed to trip(s) {:?} around that time",
                vehicle.registration_number, overlapping
            ),
        ));
    }

    let before = DeploymentRepository::for_trip(&inv.db, trip.id).await?;
    let deployment = DeploymentRepository::assign_vehicle(&inv.db, trip.id, vehicle_id).await?;
    info!(trip_id = trip.id, vehicle_id, "vehicle assigned");

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(trip.id),
        inv.user_id,
        before.as_ref().and_then(|d| serde_json::to_value(d).ok()).as_ref(),
        serde_json::to_value(&deployment).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!(
            "Assigned {} to {}",
            vehicle.registration_number, trip.display_name
        ),
        data: payload::object(&json!({"trip": trip, "deployment": deployment})),
    })
}

/// Assign a driver to a trip
pub async fn assign_driver(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip = load_trip(&inv).await?;
    let driver_id = inv.require_i64("driver_id")?;

    let driver = DriverRepository::get_by_id(&inv.db, driver_id, inv.drivers_have_status)
        .await?
        .ok_or_else(|| {
            AgentError::domain(
                ErrorKind::DriverNotFound,
                format!("driver {} not found", driver_id),
            )
        })?;

    let others = DeploymentRepository::trips_for_driver_on_date(
        &inv.db,
        driver_id,
        &trip.trip_date,
        Some(trip.id),
    )
    .await?;
    let overlapping: Vec<i64> = others
        .iter()
        .filter(|other| timeutil::within_conflict_window(&other.scheduled_time, &trip.scheduled_time))
        .map(|other| other.id)
        .collect();
    if !overlapping.is_empty() {
        return Err(AgentError::domain(
            ErrorKind::DriverConflict,
            format!(
                "{} already has trip(s) {:?} within 90 minutes",
                driver.name, overlapping
            ),
        ));
    }

    let before = DeploymentRepository::for_trip(&inv.db, trip.id).await?;
    let deployment = DeploymentRepository::assign_driver(&inv.db, trip.id, driver_id).await?;
    info!(trip_id = trip.id, driver_id, "driver assigned");

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(trip.id),
        inv.user_id,
        before.as_ref().and_then(|d| serde_json::to_value(d).ok()).as_ref(),
        serde_json::to_value(&deployment).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Assigned {} to {}", driver.name, trip.display_name),
        data: payload::object(&json!({"trip": trip, "deployment": deployment})),
    })
}

/// Remove the vehicle from a trip
pub async fn remove_vehicle(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip = load_trip(&inv).await?;
    let removed = DeploymentRepository::remove_vehicle(&inv.db, trip.id).await?;

    if removed == 0 {
        return Ok(ExecutionResult {
            message: format!("{} has no vehicle assigned", trip.display_name),
            data: payload::object(&json!({"trip": trip, "removed": false})),
        });
    }

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(trip.id),
        inv.user_id,
        serde_json::to_value(&trip).ok().as_ref(),
        None,
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Removed the vehicle from {}", trip.display_name),
        data: payload::object(&json!({"trip": trip, "removed": true})),
    })
}

/// Remove the driver from a trip
pub async fn remove_driver(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip = load_trip(&inv).await?;
    let removed = DeploymentRepository::remove_driver(&inv.db, trip.id).await?;

    if removed == 0 {
        return Ok(ExecutionResult {
            message: format!("{} has no driver assigned", trip.display_name),
            data: payload::object(&json!({"trip": trip, "removed": false})),
        });
    }

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(trip.id),
        inv.user_id,
        serde_json::to_value(&trip).ok().as_ref(),
        None,
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Removed the driver from {}", trip.display_name),
        data: payload::object(&json!({"trip": trip, "removed": true})),
    })
}

/// Cancel a trip
pub async fn cancel_trip(inv: ToolInvocation) -> Result<ExecutionResult> {
    let before = load_trip(&inv).await?;
    let after = TripRepository::update_status(&inv.db, before.id, "CANCELLED")
        .await?
        .ok_or_else(|| AgentError::domain(ErrorKind::TripNotFound, "trip vanished mid-update"))?;
    info!(trip_id = before.id, "trip cancelled");

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(before.id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        serde_json::to_value(&after).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("{} has been cancelled", after.display_name),
        data: payload::object(&after),
    })
}

/// Change a trip's scheduled time, rewriting the embedded time token in
/// its display name
pub async fn update_trip_time(inv: ToolInvocation) -> Result<ExecutionResult> {
    let before = load_trip(&inv).await?;
    let new_time = inv.require_str("new_time")?.to_string();
    if timeutil::parse_hhmm(&new_time).is_none() {
        return Err(AgentError::domain(
            ErrorKind::InvalidParameters,
            format!("'{}' is not a valid HH:MM time", new_time),
        ));
    }

    let time_token = Regex::new(r"\d{1,2}:\d{2}").expect("Invalid time pattern");
    let new_display_name = time_token
        .replace(&before.display_name, new_time.as_str())
        .into_owned();

    let after = TripRepository::update_time(&inv.db, before.id, &new_time, &new_display_name)
        .await?
        .ok_or_else(|| AgentError::domain(ErrorKind::TripNotFound, "trip vanished mid-update"))?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(before.id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        serde_json::to_value(&after).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Moved {} to {}", before.display_name, new_time),
        data: payload::object(&after),
    })
}

const TRIP_STATUSES: &[&str] = &["SCHEDULED", "IN_PROGRESS", "COMPLETED", "CANCELLED", "DELAYED"];

/// Set a trip's lifecycle status
pub async fn update_trip_status(inv: ToolInvocation) -> Result<ExecutionResult> {
    let before = load_trip(&inv).await?;
    let new_status = inv.require_str("new_status")?.to_uppercase();
    if !TRIP_STATUSES.contains(&new_status.as_str()) {
        return Err(AgentError::domain(
            ErrorKind::InvalidParameters,
            format!("'{}' is not one of {:?}", new_status, TRIP_STATUSES),
        ));
    }

    let after = TripRepository::update_status(&inv.db, before.id, &new_status)
        .await?
        .ok_or_else(|| AgentError::domain(ErrorKind::TripNotFound, "trip vanished mid-update"))?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(before.id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        serde_json::to_value(&after).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("{} is now {}", after.display_name, new_status),
        data: payload::object(&after),
    })
}

/// Delay a trip by a number of minutes
pub async fn delay_trip(inv: ToolInvocation) -> Result<ExecutionResult> {
    let before = load_trip(&inv).await?;
    let minutes = inv.require_i64("delay_minutes")?;
    if minutes <= 0 {
        return Err(AgentError::domain(
            ErrorKind::InvalidParameters,
            "delay_minutes must be positive",
        ));
    }

    let new_time = timeutil::add_minutes(&before.scheduled_time, minutes).ok_or_else(|| {
        AgentError::domain(
            ErrorKind::InvalidParameters,
            format!("trip has an unparseable time '{}'", before.scheduled_time),
        )
    })?;

    let time_token = Regex::new(r"\d{1,2}:\d{2}").expect("Invalid time pattern");
    let new_display_name = time_token
        .replace(&before.display_name, new_time.as_str())
        .into_owned();

    let after = TripRepository::update_time(&inv.db, before.id, &new_time, &new_display_name)
        .await?
        .ok_or_else(|| AgentError::domain(ErrorKind::TripNotFound, "trip vanished mid-update"))?;
    TripRepository::update_status(&inv.db, before.id, "DELAYED").await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(before.id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        serde_json::to_value(&after).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!(
            "Delayed {} by {} minutes (now {})",
            before.display_name, minutes, new_time
        ),
        data: payload::object(&after),
    })
}

/// Move a trip to another service date
pub async fn reschedule_trip(inv: ToolInvocation) -> Result<ExecutionResult> {
    let before = load_trip(&inv).await?;
    let new_date = inv.require_str("new_date")?;
    if chrono::NaiveDate::parse_from_str(new_date, "%Y-%m-%d").is_err() {
        return Err(AgentError::domain(
            ErrorKind::InvalidParameters,
            format!("'{}' is not a valid YYYY-MM-DD date", new_date),
        ));
    }

    let after = TripRepository::update_date(&inv.db, before.id, new_date)
        .await?
        .ok_or_else(|| AgentError::domain(ErrorKind::TripNotFound, "trip vanished mid-update"))?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(before.id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        serde_json::to_value(&after).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Rescheduled {} to {}", before.display_name, new_date),
        data: payload::object(&after),
    })
}

/// Current status of a trip
pub async fn get_trip_status(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip = load_trip(&inv).await?;
    Ok(ExecutionResult {
        message: format!("{} is {}", trip.display_name, trip.live_status),
        data: payload::object(&trip),
    })
}

/// Full details of a trip
pub async fn get_trip_details(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip = load_trip(&inv).await?;
    let deployment = DeploymentRepository::for_trip(&inv.db, trip.id).await?;
    let bookings = BookingRepository::active_count(&inv.db, trip.id).await?;
    Ok(ExecutionResult {
        message: format!("Details for {}", trip.display_name),
        data: payload::object(&json!({
            "trip": trip,
            "deployment": deployment,
            "active_bookings": bookings,
        })),
    })
}

/// Bookings on a trip
pub async fn get_trip_bookings(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip = load_trip(&inv).await?;
    let bookings = BookingRepository::list_active(&inv.db, trip.id).await?;
    Ok(ExecutionResult {
        message: format!("{} active bookings on {}", bookings.len(), trip.display_name),
        data: payload::table(&bookings),
    })
}

/// Whether a trip has vehicle, driver and seats
pub async fn check_trip_readiness(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip = load_trip(&inv).await?;
    let deployment = DeploymentRepository::for_trip(&inv.db, trip.id).await?;
    let bookings = BookingRepository::active_count(&inv.db, trip.id).await?;

    let has_vehicle = deployment.as_ref().map(|d| d.vehicle_id.is_some()).unwrap_or(false);
    let has_driver = deployment.as_ref().map(|d| d.driver_id.is_some()).unwrap_or(false);
    let within_capacity = bookings <= trip.capacity;
    let ready = has_vehicle && has_driver && within_capacity && !trip.is_in_progress();

    let mut issues = Vec::new();
    if !has_vehicle {
        issues.push("no vehicle assigned".to_string());
    }
    if !has_driver {
        issues.push("no driver assigned".to_string());
    }
    if !within_capacity {
        issues.push(format!("overbooked: {}/{} seats", bookings, trip.capacity));
    }

    Ok(ExecutionResult {
        message: if ready {
            format!("{} is ready to go", trip.display_name)
        } else {
            format!("{} is not ready: {}", trip.display_name, issues.join(", "))
        },
        data: payload::object(&json!({
            "trip": trip,
            "ready": ready,
            "issues": issues,
            "active_bookings": bookings,
        })),
    })
}

/// Clone a trip
pub async fn duplicate_trip(inv: ToolInvocation) -> Result<ExecutionResult> {
    let source = load_trip(&inv).await?;
    let copy = TripRepository::duplicate(&inv.db, &source).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(copy.id),
        inv.user_id,
        serde_json::to_value(&source).ok().as_ref(),
        serde_json::to_value(&copy).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Created {}", copy.display_name),
        data: payload::object(&copy),
    })
}

/// Create a trip from wizard-collected (or structured) parameters
pub async fn create_followup_trip(inv: ToolInvocation) -> Result<ExecutionResult> {
    let name = inv.require_str("name")?.to_string();
    let date = inv.opt_str("date").map(str::to_string).unwrap_or_else(today);
    let time = inv.require_str("time")?.to_string();
    let route_id = inv.opt_i64("route_id");

    if let Some(route_id) = route_id {
        if NetworkRepository::get_route(&inv.db, route_id).await?.is_none() {
            return Err(AgentError::domain(
                ErrorKind::RouteNotFound,
                format!("route {} not found", route_id),
            ));
        }
    }

    let display_name = format!("{} - {}", name, time);
    let trip = TripRepository::create(&inv.db, &display_name, route_id, &date, &time, 12).await?;

    if let Some(vehicle_id) = inv.opt_i64("vehicle_id") {
        DeploymentRepository::assign_vehicle(&inv.db, trip.id, vehicle_id).await?;
    }
    if let Some(driver_id) = inv.opt_i64("driver_id") {
        DeploymentRepository::assign_driver(&inv.db, trip.id, driver_id).await?;
    }

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(trip.id),
        inv.user_id,
        None,
        serde_json::to_value(&trip).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Created trip {}", trip.display_name),
        data: payload::object(&trip),
    })
}
