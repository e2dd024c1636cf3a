//! Driver tools

use serde_json::json;

use crate::db::models::Driver;
use crate::db::repositories::{
    today, AuditRepository, DeploymentRepository, DriverRepository, TripRepository,
};
use crate::error::{AgentError, ErrorKind, Result};
use crate::state::{EntityType, ExecutionResult};
use crate::timeutil;
use crate::tools::{payload, ToolInvocation};

async fn load_driver(inv: &ToolInvocation) -> Result<Driver> {
    let driver_id = inv
        .resolved_id(EntityType::Driver)
        .or_else(|| inv.opt_i64("driver_id"));
    if let Some(id) = driver_id {
        return DriverRepository::get_by_id(&inv.db, id, inv.drivers_have_status)
            .await?
            .ok_or_else(|| {
                AgentError::domain(ErrorKind::DriverNotFound, format!("driver {} not found", id))
            });
    }
    if let Some(name) = inv.opt_str("name") {
        let matches =
            DriverRepository::find_by_name(&inv.db, name, inv.drivers_have_status).await?;
        return matches.into_iter().next().ok_or_else(|| {
            AgentError::domain(ErrorKind::DriverNotFound, format!("no driver named '{}'", name))
        });
    }
    Err(AgentError::domain(
        ErrorKind::MissingParameters,
        "no driver was specified",
    ))
}

/// Every driver
pub async fn list_all_drivers(inv: ToolInvocation) -> Result<ExecutionResult> {
    let drivers = DriverRepository::list_all(&inv.db, inv.drivers_have_status).await?;
    Ok(ExecutionResult {
        message: format!("{} drivers", drivers.len()),
        data: payload::table(&drivers),
    })
}

/// Drivers free for a trip: shift covers the time, no 90-minute overlap,
/// not marked unavailable
pub async fn get_available_drivers(inv: ToolInvocation) -> Result<ExecutionResult> {
    let trip_id = inv.trip_id()?;
    let trip = TripRepository::get_by_id(&inv.db, trip_id)
        .await?
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::TripNotFound, format!("trip {} not found", trip_id))
        })?;

    let mut available = Vec::new();
    for driver in DriverRepository::list_all(&inv.db, inv.drivers_have_status).await? {
        if !driver.is_available() {
            continue;
        }
        if !timeutil::shift_covers(&driver.shift_start, &driver.shift_end, &trip.scheduled_time) {
            continue;
        }
        let others = DeploymentRepository::trips_for_driver_on_date(
            &inv.db,
            driver.id,
            &trip.trip_date,
            Some(trip.id),
        )
        .await?;
        let conflicted = others
            .iter()
            .any(|t| timeutil::within_conflict_window(&t.scheduled_time, &trip.scheduled_time));
        if !conflicted {
            available.push(driver);
        }
    }

    Ok(ExecutionResult {
        message: format!(
            "{} driver(s) available for {}",
            available.len(),
            trip.display_name
        ),
        data: payload::table(&available),
    })
}

/// Status of one driver
pub async fn get_driver_status(inv: ToolInvocation) -> Result<ExecutionResult> {
    let driver = load_driver(&inv).await?;
    let trips =
        DeploymentRepository::trips_for_driver_on_date(&inv.db, driver.id, &today(), None).await?;
    Ok(ExecutionResult {
        message: format!(
            "{} ({} - {}) has {} trip(s) today",
            driver.name,
            driver.shift_start,
            driver.shift_end,
            trips.len()
        ),
        data: payload::object(&json!({"driver": driver, "trips_today": trips.len()})),
    })
}

/// Today's trips for one driver
pub async fn get_driver_trips_today(inv: ToolInvocation) -> Result<ExecutionResult> {
    let driver = load_driver(&inv).await?;
    let trips =
        DeploymentRepository::trips_for_driver_on_date(&inv.db, driver.id, &today(), None).await?;
    Ok(ExecutionResult {
        message: format!("{} has {} trip(s) today", driver.name, trips.len()),
        data: payload::table(&trips),
    })
}

/// Mark a driver available or unavailable
pub async fn set_driver_availability(inv: ToolInvocation) -> Result<ExecutionResult> {
    let before = load_driver(&inv).await?;
    let available = match inv.parameters.get("available") {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => {
            matches!(s.to_lowercase().as_str(), "true" | "yes" | "available" | "active")
        }
        _ => {
            return Err(AgentError::domain(
                ErrorKind::MissingParameters,
                "missing required parameter 'available'",
            ))
        }
    };
    let status = if available { "active" } else { "unavailable" };

    let after = DriverRepository::set_status(&inv.db, before.id, status, inv.drivers_have_status)
        .await?
        .ok_or_else(|| AgentError::domain(ErrorKind::DriverNotFound, "driver vanished"))?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "driver",
        Some(before.id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        serde_json::to_value(&after).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("{} is now {}", after.name, status),
        data: payload::object(&after),
    })
}

/// Register a new driver
pub async fn add_driver(inv: ToolInvocation) -> Result<ExecutionResult> {
    let name = inv.require_str("name")?.to_string();
    let shift_start = inv.opt_str("shift_start").unwrap_or("06:00").to_string();
    let shift_end = inv.opt_str("shift_end").unwrap_or("22:00").to_string();

    for value in [&shift_start, &shift_end] {
        if timeutil::parse_hhmm(value).is_none() {
            return Err(AgentError::domain(
                ErrorKind::InvalidParameters,
                format!("'{}' is not a valid HH:MM time", value),
            ));
        }
    }

    let driver = DriverRepository::create(
        &inv.db,
        &name,
        &shift_start,
        &shift_end,
        inv.drivers_have_status,
    )
    .await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "driver",
        Some(driver.id),
        inv.user_id,
        None,
        serde_json::to_value(&driver).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Registered driver {}", driver.name),
        data: payload::object(&driver),
    })
}

/// Look a driver up by name (exact first, then first-token)
pub async fn find_driver_by_name(inv: ToolInvocation) -> Result<ExecutionResult> {
    let name = inv.require_str("name")?;
    let matches = DriverRepository::find_by_name(&inv.db, name, inv.drivers_have_status).await?;
    Ok(ExecutionResult {
        message: format!("{} driver(s) match '{}'", matches.len(), name),
        data: payload::table(&matches),
    })
}
