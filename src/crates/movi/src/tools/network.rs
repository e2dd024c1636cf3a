//! Network configuration tools: stops, paths and routes

use serde_json::{json, Value};

use crate::db::repositories::{AuditRepository, NetworkRepository, TripRepository};
use crate::error::{AgentError, ErrorKind, Result};
use crate::state::{EntityType, ExecutionResult};
use crate::timeutil;
use crate::tools::{payload, ToolInvocation};

fn stop_ids_param(inv: &ToolInvocation) -> Result<Vec<i64>> {
    match inv.parameters.get("stop_ids") {
        Some(Value::Array(items)) => {
            let ids: Option<Vec<i64>> = items
                .iter()
                .map(|v| match v {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                })
                .collect();
            ids.ok_or_else(|| {
                AgentError::domain(ErrorKind::InvalidParameters, "stop_ids must be integers")
            })
        }
        Some(Value::String(csv)) => {
            let ids: std::result::Result<Vec<i64>, _> =
                csv.split(',').map(|part| part.trim().parse::<i64>()).collect();
            ids.map_err(|_| {
                AgentError::domain(
                    ErrorKind::InvalidParameters,
                    "stop_ids must be a comma-separated list of integers",
                )
            })
        }
        _ => Err(AgentError::domain(
            ErrorKind::MissingParameters,
            "missing required parameter 'stop_ids'",
        )),
    }
}

// ----------------------------------------------------------------------
// Stops
// ----------------------------------------------------------------------

/// Every stop
pub async fn list_all_stops(inv: ToolInvocation) -> Result<ExecutionResult> {
    let stops = NetworkRepository::list_stops(&inv.db).await?;
    Ok(ExecutionResult {
        message: format!("{} stops", stops.len()),
        data: payload::table(&stops),
    })
}

/// Create a stop
pub async fn create_stop(inv: ToolInvocation) -> Result<ExecutionResult> {
    let name = inv.require_str("name")?.to_string();
    let latitude = inv
        .parameters
        .get("latitude")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let longitude = inv
        .parameters
        .get("longitude")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let stop = NetworkRepository::create_stop(&inv.db, &name, latitude, longitude).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "stop",
        Some(stop.id),
        inv.user_id,
        None,
        serde_json::to_value(&stop).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Created stop '{}'", stop.name),
        data: payload::object(&stop),
    })
}

/// Rename a stop
pub async fn rename_stop(inv: ToolInvocation) -> Result<ExecutionResult> {
    let stop_id = inv
        .resolved_id(EntityType::Stop)
        .or_else(|| inv.opt_i64("stop_id"))
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::StopNotFound, "no target stop was resolved")
        })?;
    let new_name = inv.require_str("new_name")?;

    let before = NetworkRepository::get_stop(&inv.db, stop_id).await?.ok_or_else(|| {
        AgentError::domain(ErrorKind::StopNotFound, format!("stop {} not found", stop_id))
    })?;
    let after = NetworkRepository::rename_stop(&inv.db, stop_id, new_name)
        .await?
        .ok_or_else(|| AgentError::domain(ErrorKind::StopNotFound, "stop vanished"))?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "stop",
        Some(stop_id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        serde_json::to_value(&after).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Renamed '{}' to '{}'", before.name, after.name),
        data: payload::object(&after),
    })
}

/// Delete a stop
pub async fn delete_stop(inv: ToolInvocation) -> Result<ExecutionResult> {
    let stop_id = inv
        .resolved_id(EntityType::Stop)
        .or_else(|| inv.opt_i64("stop_id"))
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::StopNotFound, "no target stop was resolved")
        })?;
    let before = NetworkRepository::get_stop(&inv.db, stop_id).await?.ok_or_else(|| {
        AgentError::domain(ErrorKind::StopNotFound, format!("stop {} not found", stop_id))
    })?;

    NetworkRepository::delete_stop(&inv.db, stop_id).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "stop",
        Some(stop_id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        None,
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Deleted stop '{}'", before.name),
        data: payload::object(&before),
    })
}

/// Ordered stops of a path
pub async fn list_stops_for_path(inv: ToolInvocation) -> Result<ExecutionResult> {
    let path_id = inv
        .resolved_id(EntityType::Path)
        .or_else(|| inv.opt_i64("path_id"))
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::PathNotFound, "no target path was resolved")
        })?;
    let path = NetworkRepository::get_path(&inv.db, path_id).await?.ok_or_else(|| {
        AgentError::domain(ErrorKind::PathNotFound, format!("path {} not found", path_id))
    })?;
    let stops = NetworkRepository::stops_for_path(&inv.db, path_id).await?;
    Ok(ExecutionResult {
        message: format!("{} has {} stops", path.path_name, stops.len()),
        data: payload::table(&stops),
    })
}

// ----------------------------------------------------------------------
// Paths
// ----------------------------------------------------------------------

/// Create a path with its ordered stops
pub async fn create_path(inv: ToolInvocation) -> Result<ExecutionResult> {
    let name = inv.require_str("name")?.to_string();
    let stop_ids = stop_ids_param(&inv)?;
    if stop_ids.len() < 2 {
        return Err(AgentError::domain(
            ErrorKind::InvalidParameters,
            "a path needs at least 2 stops",
        ));
    }
    for stop_id in &stop_ids {
        if NetworkRepository::get_stop(&inv.db, *stop_id).await?.is_none() {
            return Err(AgentError::domain(
                ErrorKind::StopNotFound,
                format!("stop {} not found", stop_id),
            ));
        }
    }

    let path = NetworkRepository::create_path(&inv.db, &name, &stop_ids).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "path",
        Some(path.id),
        inv.user_id,
        None,
        Some(&json!({"path": path, "stop_ids": stop_ids})),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Created path '{}' with {} stops", path.path_name, stop_ids.len()),
        data: payload::object(&path),
    })
}

/// Replace the ordered stops of a path
pub async fn update_path_stops(inv: ToolInvocation) -> Result<ExecutionResult> {
    let path_id = inv
        .resolved_id(EntityType::Path)
        .or_else(|| inv.opt_i64("path_id"))
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::PathNotFound, "no target path was resolved")
        })?;
    let path = NetworkRepository::get_path(&inv.db, path_id).await?.ok_or_else(|| {
        AgentError::domain(ErrorKind::PathNotFound, format!("path {} not found", path_id))
    })?;
    let stop_ids = stop_ids_param(&inv)?;
    if stop_ids.len() < 2 {
        return Err(AgentError::domain(
            ErrorKind::InvalidParameters,
            "a path needs at least 2 stops",
        ));
    }

    let before = NetworkRepository::stops_for_path(&inv.db, path_id).await?;
    NetworkRepository::set_path_stops(&inv.db, path_id, &stop_ids).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "path",
        Some(path_id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        Some(&json!({"stop_ids": stop_ids})),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Updated stops of '{}'", path.path_name),
        data: payload::object(&json!({"path": path, "stop_ids": stop_ids})),
    })
}

/// Delete a path
pub async fn delete_path(inv: ToolInvocation) -> Result<ExecutionResult> {
    let path_id = inv
        .resolved_id(EntityType::Path)
        .or_else(|| inv.opt_i64("path_id"))
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::PathNotFound, "no target path was resolved")
        })?;
    let before = NetworkRepository::get_path(&inv.db, path_id).await?.ok_or_else(|| {
        AgentError::domain(ErrorKind::PathNotFound, format!("path {} not found", path_id))
    })?;

    NetworkRepository::delete_path(&inv.db, path_id).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "path",
        Some(path_id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        None,
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Deleted path '{}'", before.path_name),
        data: payload::object(&before),
    })
}

/// Every path
pub async fn list_all_paths(inv: ToolInvocation) -> Result<ExecutionResult> {
    let paths = NetworkRepository::list_paths(&inv.db).await?;
    Ok(ExecutionResult {
        message: format!("{} paths", paths.len()),
        data: payload::table(&paths),
    })
}

/// Routes built on a path
pub async fn list_routes_using_path(inv: ToolInvocation) -> Result<ExecutionResult> {
    let path_id = inv
        .resolved_id(EntityType::Path)
        .or_else(|| inv.opt_i64("path_id"))
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::PathNotFound, "no target path was resolved")
        })?;
    let routes = NetworkRepository::routes_using_path(&inv.db, path_id).await?;
    Ok(ExecutionResult {
        message: format!("{} route(s) use this path", routes.len()),
        data: payload::table(&routes),
    })
}

// ----------------------------------------------------------------------
// Routes
// ----------------------------------------------------------------------

/// Create a route
pub async fn create_route(inv: ToolInvocation) -> Result<ExecutionResult> {
    let name = inv.require_str("name")?.to_string();
    let path_id = inv.require_i64("path_id")?;
    let shift_time = inv.opt_str("shift_time").unwrap_or("07:00").to_string();
    let direction = inv.opt_str("direction").unwrap_or("up").to_lowercase();

    if NetworkRepository::get_path(&inv.db, path_id).await?.is_none() {
        return Err(AgentError::domain(
            ErrorKind::PathNotFound,
            format!("path {} not found", path_id),
        ));
    }
    if timeutil::parse_hhmm(&shift_time).is_none() {
        return Err(AgentError::domain(
            ErrorKind::InvalidParameters,
            format!("'{}' is not a valid HH:MM time", shift_time),
        ));
    }
    if direction != "up" && direction != "down" {
        return Err(AgentError::domain(
            ErrorKind::InvalidParameters,
            "direction must be 'up' or 'down'",
        ));
    }

    let route =
        NetworkRepository::create_route(&inv.db, &name, path_id, &shift_time, &direction).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "route",
        Some(route.id),
        inv.user_id,
        None,
        serde_json::to_value(&route).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Created route '{}'", route.route_name),
        data: payload::object(&route),
    })
}

/// Clone a route
pub async fn duplicate_route(inv: ToolInvocation) -> Result<ExecutionResult> {
    let route_id = inv
        .resolved_id(EntityType::Route)
        .or_else(|| inv.opt_i64("route_id"))
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::RouteNotFound, "no target route was resolved")
        })?;
    let source = NetworkRepository::get_route(&inv.db, route_id).await?.ok_or_else(|| {
        AgentError::domain(ErrorKind::RouteNotFound, format!("route {} not found", route_id))
    })?;

    let copy = NetworkRepository::duplicate_route(&inv.db, route_id).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "route",
        Some(copy.id),
        inv.user_id,
        serde_json::to_value(&source).ok().as_ref(),
        serde_json::to_value(&copy).ok().as_ref(),
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Created '{}'", copy.route_name),
        data: payload::object(&copy),
    })
}

/// Delete a route
pub async fn delete_route(inv: ToolInvocation) -> Result<ExecutionResult> {
    let route_id = inv
        .resolved_id(EntityType::Route)
        .or_else(|| inv.opt_i64("route_id"))
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::RouteNotFound, "no target route was resolved")
        })?;
    let before = NetworkRepository::get_route(&inv.db, route_id).await?.ok_or_else(|| {
        AgentError::domain(ErrorKind::RouteNotFound, format!("route {} not found", route_id))
    })?;

    NetworkRepository::delete_route(&inv.db, route_id).await?;

    AuditRepository::record_best_effort(
        &inv.db,
        &inv.action,
        "route",
        Some(route_id),
        inv.user_id,
        serde_json::to_value(&before).ok().as_ref(),
        None,
    )
    .await;

    Ok(ExecutionResult {
        message: format!("Deleted route '{}'", before.route_name),
        data: payload::object(&before),
    })
}

/// Every route
pub async fn list_all_routes(inv: ToolInvocation) -> Result<ExecutionResult> {
    let routes = NetworkRepository::list_routes(&inv.db).await?;
    Ok(ExecutionResult {
        message: format!("{} routes", routes.len()),
        data: payload::table(&routes),
    })
}

/// Check a route's configuration is complete
pub async fn validate_route(inv: ToolInvocation) -> Result<ExecutionResult> {
    let route_id = inv
        .resolved_id(EntityType::Route)
        .or_else(|| inv.opt_i64("route_id"))
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::RouteNotFound, "no target route was resolved")
        })?;
    let route = NetworkRepository::get_route(&inv.db, route_id).await?.ok_or_else(|| {
        AgentError::domain(ErrorKind::RouteNotFound, format!("route {} not found", route_id))
    })?;

    let mut issues = Vec::new();
    match route.path_id {
        None => issues.push("route has no path".to_string()),
        Some(path_id) => {
            let stops = NetworkRepository::stops_for_path(&inv.db, path_id).await?;
            if stops.len() < 2 {
                issues.push(format!("path has only {} stop(s)", stops.len()));
            }
        }
    }
    if route.shift_time.is_none() {
        issues.push("route has no shift time".to_string());
    }
    if route.direction.is_none() {
        issues.push("route has no direction".to_string());
    }
    let trips = TripRepository::count_for_route(&inv.db, route_id).await?;

    let valid = issues.is_empty();
    Ok(ExecutionResult {
        message: if valid {
            format!("'{}' is valid ({} trips attached)", route.route_name, trips)
        } else {
            format!("'{}' has issues: {}", route.route_name, issues.join(", "))
        },
        data: payload::object(&json!({
            "route": route,
            "valid": valid,
            "issues": issues,
            "trips_attached": trips,
        })),
    })
}
