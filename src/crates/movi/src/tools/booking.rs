//! Booking tools

use serde_json::json;

use crate::db::repositories::{AuditRepository, BookingRepository, TripRepository};
use crate::error::{AgentError, ErrorKind, Result};
use crate::state::ExecutionResult;
use crate::tools::{payload, ToolInvocation};

/// Active booking count for a trip
pub async fn get_booking_count(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip_id = inv.trip_id()?;
    let trip = TripRepository::get_by_id(&inv.db, trip_id)
        .await?
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::TripNotFound, format!("trip {} not found", trip_id))
        })?;
    let count = BookingRepository::active_count(&inv.db, trip.id).await?;
    let percentage = if trip.capacity > 0 {
        (count as f64 / trip.capacity as f64) * 100.0
    } else {
        0.0
    };
    Ok(ExecutionResult {
        message: format!(
            "{} has {} booking(s) ({:.0}% of capacity)",
            trip.display_name, count, percentage
        ),
        data: payload::object(&json!({
            "trip_id": trip.id,
            "booking_count": count,
            "capacity": trip.capacity,
            "booking_percentage": percentage,
        })),
    })
}

/// Passenger list for a trip
pub async fn list_passengers(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip_id = inv.trip_id()?;
    let bookings = BookingRepository::list_active(&inv.db, trip_id).await?;
    Ok(ExecutionResult {
        message: format!("{} passenger(s)", bookings.len()),
        data: payload::table(&bookings),
    })
}

/// Cancel every active booking on a trip
pub async fn cancel_all_bookings(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip_id = inv.trip_id()?;
    let trip = TripRepository::get_by_id(&inv.db, trip_id)
        .await?
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::TripNotFound, format!("trip {} not found", trip_id))
        })?;

    let cancelled = BookingRepository::cancel_all(&inv.db, trip.id).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "trip",
        Some(trip.id),
        inv.user_id,
        Some(&json!({"active_bookings": cancelled})),
        Some(&json!({"active_bookings": 0})),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Cancelled {} booking(s) on {}", cancelled, trip.display_name),
        data: payload::object(&json!({"trip": trip, "cancelled": cancelled})),
    })
}

/// Trips an employee is booked on
pub async fn find_employee_trips(inv: ToolInvocation) -> Result<ExecutionResult> {
    let employee = inv.require_str("employee_name")?;
    let trips = BookingRepository::trips_for_employee(&inv.db, employee).await?;
    Ok(ExecutionResult {
        message: format!("{} trip(s) booked by '{}'", trips.len(), employee),
        data: payload::table(&trips),
    })
}
