//! Vehicle tools

use serde_json::json;

use crate::db::models::Vehicle;
use crate::db::repositories::{
    today, AuditRepository, BookingRepository, DeploymentRepository, TripRepository,
    VehicleRepository,
};
use crate::error::{AgentError, ErrorKind, Result};
use crate::state::{EntityType, ExecutionResult};
use crate::tools::{payload, ToolInvocation};

async fn load_vehicle(inv: &ToolInvocation) -> Result<Vehicle> {
    let vehicle_id = inv
        .resolved_id(EntityType::Vehicle)
        .or_else(|| inv.opt_i64("vehicle_id"));
    if let Some(id) = vehicle_id {
        return VehicleRepository::get_by_id(&inv.db, id).await?.ok_or_else(|| {
            AgentError::domain(ErrorKind::VehicleNotFound, format!("vehicle {} not found", id))
        });
    }
    if let Some(registration) = inv.opt_str("registration_number") {
        let matches = VehicleRepository::find_by_registration(&inv.db, registration).await?;
        return matches.into_iter().next().ok_or_else(|| {
            AgentError::domain(
                ErrorKind::VehicleNotFound,
                format!("no vehicle with plate '{}'", registration),
            )
        });
    }
    Err(AgentError::domain(
        ErrorKind::MissingParameters,
        "no vehicle was specified",
    ))
}

/// Every vehicle
pub async fn list_all_vehicles(inv: ToolInvocation) -> Result<ExecutionResult> {
    let vehicles = VehicleRepository::list_all(&inv.db).await?;
    Ok(ExecutionResult {
        message: format!("{} vehicles", vehicles.len()),
        data: payload::table(&vehicles),
    })
}

/// Deployable vehicles without a deployment today
pub async fn get_unassigned_vehicles(inv: ToolInvocation) -> Result<ExecutionResult> {
    let vehicles = VehicleRepository::unassigned_on_date(&inv.db, &today()).await?;
    Ok(ExecutionResult {
        message: format!("{} vehicles are unassigned today", vehicles.len()),
        data: payload::table(&vehicles),
    })
}

/// Status of one vehicle
pub async fn get_vehicle_status(inv: ToolInvocation) -> Result<ExecutionResult> {
    let vehicle = load_vehicle(&inv).await?;
    let deployments =
        DeploymentRepository::vehicle_deployment_count(&inv.db, vehicle.id, &today()).await?;
    Ok(ExecutionResult {
        message: format!(
            "{} is {} with {} deployment(s) today",
            vehicle.registration_number, vehicle.status, deployments
        ),
        data: payload::object(&json!({"vehicle": vehicle, "deployments_today": deployments})),
    })
}

/// Today's trips for one vehicle
pub async fn get_vehicle_trips_today(inv: ToolInvocation) -> Result<ExecutionResult> {
    let vehicle = load_vehicle(&inv).await?;
    let trips =
        DeploymentRepository::trips_for_vehicle_on_date(&inv.db, vehicle.id, &today(), None)
            .await?;
    Ok(ExecutionResult {
        message: format!(
            "{} has {} trip(s) today",
            vehicle.registration_number,
            trips.len()
        ),
        data: payload::table(&trips),
    })
}

async fn set_vehicle_status(
    inv: &ToolInvocation,
    status: &str,
    verb: &str,
) -> Result<ExecutionResult> {
    let before = load_vehicle(inv).await?;
    let after = VehicleRepository::set_status(&inv.db, before.id, status)
        .await?
        .ok_or_else(|| AgentError::domain(ErrorKind::VehicleNotFound, "vehicle vanished"))?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "vehicle",
        Some(before.id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        serde_json::to_value(&after).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("{} {}", after.registration_number, verb),
        data: payload::object(&after),
    })
}

/// Take a vehicle out of service
pub async fn block_vehicle(inv: ToolInvocation) -> Result<ExecutionResult> {
    set_vehicle_status(&inv, "blocked", "is now blocked").await
}

/// Return a vehicle to service
pub async fn unblock_vehicle(inv: ToolInvocation) -> Result<ExecutionResult> {
    set_vehicle_status(&inv, "active", "is back in service").await
}

/// Register a new vehicle
pub async fn add_vehicle(inv: ToolInvocation) -> Result<ExecutionResult> {
    let registration = inv.require_str("registration_number")?.to_string();
    let capacity = inv.opt_i64("capacity").unwrap_or(12);

    let existing = VehicleRepository::find_by_registration(&inv.db, &registration).await?;
    if !existing.is_empty() {
        return Err(AgentError::domain(
            ErrorKind::InvalidParameters,
            format!("a vehicle with plate '{}' already exists", registration),
        ));
    }

    let vehicle = VehicleRepository::create(&inv.db, &registration, capacity).await?;
    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "vehicle",
        Some(vehicle.id),
        inv.user_id,
        None,
        serde_json::to_value(&vehicle).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Registered {}", vehicle.registration_number),
        data: payload::object(&vehicle),
    })
}

/// Best available vehicle for a trip: smallest one that fits the bookings
pub async fn recommend_vehicle_for_trip(inv: ToolInvocation) -> Result<ExecutionResult> {
    recommend(inv, None).await
}

/// Alternative vehicle for a trip, excluding the one already assigned
pub async fn suggest_alternate_vehicle(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip_id = inv.trip_id()?;
    let current = DeploymentRepository::for_trip(&inv.db, trip_id)
        .await?
        .and_then(|d| d.vehicle_id);
    recommend(inv, current).await
}

async fn recommend(inv: ToolInvocation, exclude: Option<i64>) -> Result<ExecutionResult> {
    let trip_id = inv.trip_id()?;
    let trip = TripRepository::get_by_id(&inv.db, trip_id)
        .await?
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::TripNotFound, format!("trip {} not found", trip_id))
        })?;
    let bookings = BookingRepository::active_count(&inv.db, trip.id).await?;

    let mut candidates = VehicleRepository::unassigned_on_date(&inv.db, &trip.trip_date).await?;
    candidates.retain(|v| Some(v.id) != exclude && v.capacity >= bookings);
    candidates.sort_by_key(|v| v.capacity);

    match candidates.first() {
        Some(vehicle) => Ok(ExecutionResult {
            message: format!(
                "{} (capacity {}) fits {} with {} booking(s)",
                vehicle.registration_number, vehicle.capacity, trip.display_name, bookings
            ),
            data: payload::object(&json!({"trip": trip, "recommendation": vehicle})),
        }),
        None => Ok(ExecutionResult {
            message: format!(
                "No free vehicle can seat the {} booking(s) on {}",
                bookings, trip.display_name
            ),
            data: payload::object(&json!({"trip": trip, "recommendation": null})),
        }),
    }
}
