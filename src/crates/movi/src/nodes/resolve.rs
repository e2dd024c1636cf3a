//! Target resolution: the `resolve_target` node
//!
//! Promotes the intent's fuzzy target into a concrete database id using a
//! priority ladder (OCR id, model id, model label, UI selection, regex
//! extraction). When the action expects a path, route or stop, the
//! resolver stays within that category and never falls back to trips.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::catalog::TargetKind;
use crate::context::AgentContext;
use crate::db::repositories::{DriverRepository, NetworkRepository, TripRepository, VehicleRepository};
use crate::error::ErrorKind;
use crate::state::{
    ClarificationOption, EntityType, FlowState, ResolveOutcome, ResolvedTarget,
};

/// The `resolve_target` node
pub async fn resolve_target_node(
    ctx: Arc<AgentContext>,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    let Some(spec) = ctx.catalog.get(&state.intent.action) else {
        state.resolve_result = Some(ResolveOutcome::Skipped);
        return Ok(state);
    };

    match spec.target {
        TargetKind::None => {
            state.resolve_result = Some(ResolveOutcome::Skipped);
            Ok(state)
        }
        TargetKind::Trip => resolve_trip(&ctx, state).await,
        TargetKind::Path => resolve_path(&ctx, state).await,
        TargetKind::Route => resolve_route(&ctx, state).await,
        TargetKind::Stop => resolve_stop(&ctx, state).await,
        TargetKind::Vehicle => resolve_vehicle(&ctx, state).await,
        TargetKind::Driver => resolve_driver(&ctx, state).await,
    }
}

async fn resolve_trip(
    ctx: &AgentContext,
    mut state: FlowState,
) -> flow_core::Result<FlowState> {
    // 1. OCR bypass: the selection came attached to extracted text.
    if state.from_image {
        if let Some(trip_id) = state.selected_trip_id {
            if let Some(trip) = fetch_trip(ctx, &mut state, trip_id).await? {
                found(&mut state, EntityType::Trip, trip.id, trip.display_name);
                return Ok(state);
            }
            return Ok(state);
        }
    }

    // 2. Model-provided id.
    if let Some(trip_id) = state.intent.target_trip_id {
        if let Some(trip) = fetch_trip(ctx, &mut state, trip_id).await? {
            found(&mut state, EntityType::Trip, trip.id, trip.display_name);
        }
        return Ok(state);
    }

    // 3. Model-provided label.
    if let Some(label) = state.intent.target_label.clone() {
        if try_trip_label(ctx, &mut state, &label).await? {
            return Ok(state);
        }
        if state.resolve_result == Some(ResolveOutcome::Ambiguous) {
            return Ok(state);
        }
    }

    // 3b. Explicit parameter id.
    if let Some(trip_id) = state.param_i64("trip_id") {
        if let Some(trip) = fetch_trip(ctx, &mut state, trip_id).await? {
            found(&mut state, EntityType::Trip, trip.id, trip.display_name);
        }
        return Ok(state);
    }

    // 4. UI selection for vague references ("this trip", pronouns).
    if state.intent.target_label.is_none() {
        if let Some(trip_id) = state.selected_trip_id {
            if let Some(trip) = fetch_trip(ctx, &mut state, trip_id).await? {
                found(&mut state, EntityType::Trip, trip.id, trip.display_name);
            }
            return Ok(state);
        }
    }

    // 5. Regex extraction from the raw text, then retry the label rung.
    if let Some(label) = extract_label(&state.input_text) {
        if try_trip_label(ctx, &mut state, &label).await? {
            return Ok(state);
        }
        if state.resolve_result == Some(ResolveOutcome::Ambiguous) {
            return Ok(state);
        }
    }

    not_found(&mut state, ErrorKind::TripNotFound, "trip");
    Ok(state)
}

async fn fetch_trip(
    ctx: &AgentContext,
    state: &mut FlowState,
    trip_id: i64,
) -> flow_core::Result<Option<crate::db::models::Trip>> {
    match TripRepository::get_by_id(&ctx.db, trip_id).await {
        Ok(Some(trip)) => Ok(Some(trip)),
        Ok(None) => {
            state.resolve_result = Some(ResolveOutcome::NotFound);
            state.set_error(
                ErrorKind::TripNotFound,
                format!("trip {} does not exist", trip_id),
            );
            Ok(None)
        }
        Err(e) => {
            state.resolve_result = Some(ResolveOutcome::NotFound);
            state.set_error(ErrorKind::DatabaseError, e.to_string());
            Ok(None)
        }
    }
}

/// Returns true when the label settled the resolution (found). Ambiguity
/// is recorded on the state and also ends the ladder.
async fn try_trip_label(
    ctx: &AgentContext,
    state: &mut FlowState,
    label: &str,
) -> flow_core::Result<bool> {
    let matches = match TripRepository::find_by_label(&ctx.db, label).await {
        Ok(matches) => matches,
        Err(e) => {
            state.set_error(ErrorKind::DatabaseError, e.to_string());
            state.resolve_result = Some(ResolveOutcome::NotFound);
            return Ok(false);
        }
    };
    match matches.len() {
        0 => Ok(false),
        1 => {
            let trip = &matches[0];
            found(state, EntityType::Trip, trip.id, trip.display_name.clone());
            Ok(true)
        }
        _ => {
            debug!(label = %label, count = matches.len(), "ambiguous trip label");
            state.resolve_result = Some(ResolveOutcome::Ambiguous);
            state.needs_clarification = true;
            state.clarification_options = matches
                .iter()
                .map(|trip| ClarificationOption {
                    id: trip.id.to_string(),
                    label: trip.display_name.clone(),
                    description: format!("{} {}", trip.trip_date, trip.scheduled_time),
                })
                .collect();
            state.reply = Some(format!("Several trips match '{}'. Which one?", label));
            Ok(false)
        }
    }
}

async fn resolve_path(ctx: &AgentContext, mut state: FlowState) -> flow_core::Result<FlowState> {
    if let Some(path_id) = state.param_i64("path_id") {
        match NetworkRepository::get_path(&ctx.db, path_id).await {
            Ok(Some(path)) => {
                found(&mut state, EntityType::Path, path.id, path.path_name);
                return Ok(state);
            }
            Ok(None) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    if let Some(label) = label_hint(&state) {
        match NetworkRepository::find_paths_by_name(&ctx.db, &label).await {
            Ok(matches) if matches.len() == 1 => {
                let path = &matches[0];
                found(&mut state, EntityType::Path, path.id, path.path_name.clone());
                return Ok(state);
            }
            Ok(matches) if matches.len() > 1 => {
                ambiguous(
                    &mut state,
                    &label,
                    matches
                        .iter()
                        .map(|p| ClarificationOption {
                            id: p.id.to_string(),
                            label: p.path_name.clone(),
                            description: "path".to_string(),
                        })
                        .collect(),
                );
                return Ok(state);
            }
            Ok(_) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    not_found(&mut state, ErrorKind::PathNotFound, "path");
    Ok(state)
}

async fn resolve_route(ctx: &AgentContext, mut state: FlowState) -> flow_core::Result<FlowState> {
    if let Some(route_id) = state.param_i64("route_id").or(state.selected_route_id) {
        match NetworkRepository::get_route(&ctx.db, route_id).await {
            Ok(Some(route)) => {
                found(&mut state, EntityType::Route, route.id, route.route_name);
                return Ok(state);
            }
            Ok(None) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    if let Some(label) = label_hint(&state) {
        match NetworkRepository::find_routes_by_name(&ctx.db, &label).await {
            Ok(matches) if matches.len() == 1 => {
                let route = &matches[0];
                found(&mut state, EntityType::Route, route.id, route.route_name.clone());
                return Ok(state);
            }
            Ok(matches) if matches.len() > 1 => {
                ambiguous(
                    &mut state,
                    &label,
                    matches
                        .iter()
                        .map(|r| ClarificationOption {
                            id: r.id.to_string(),
                            label: r.route_name.clone(),
                            description: "route".to_string(),
                        })
                        .collect(),
                );
                return Ok(state);
            }
            Ok(_) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    not_found(&mut state, ErrorKind::RouteNotFound, "route");
    Ok(state)
}

async fn resolve_stop(ctx: &AgentContext, mut state: FlowState) -> flow_core::Result<FlowState> {
    if let Some(stop_id) = state.param_i64("stop_id") {
        match NetworkRepository::get_stop(&ctx.db, stop_id).await {
            Ok(Some(stop)) => {
                found(&mut state, EntityType::Stop, stop.id, stop.name);
                return Ok(state);
            }
            Ok(None) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    if let Some(label) = label_hint(&state) {
        match NetworkRepository::find_stops_by_name(&ctx.db, &label).await {
            Ok(matches) if matches.len() == 1 => {
                let stop = &matches[0];
                found(&mut state, EntityType::Stop, stop.id, stop.name.clone());
                return Ok(state);
            }
            Ok(matches) if matches.len() > 1 => {
                ambiguous(
                    &mut state,
                    &label,
                    matches
                        .iter()
                        .map(|s| ClarificationOption {
                            id: s.id.to_string(),
                            label: s.name.clone(),
                            description: "stop".to_string(),
                        })
                        .collect(),
                );
                return Ok(state);
            }
            Ok(_) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    not_found(&mut state, ErrorKind::StopNotFound, "stop");
    Ok(state)
}

async fn resolve_vehicle(ctx: &AgentContext, mut state: FlowState) -> flow_core::Result<FlowState> {
    if let Some(vehicle_id) = state.param_i64("vehicle_id") {
        match VehicleRepository::get_by_id(&ctx.db, vehicle_id).await {
            Ok(Some(vehicle)) => {
                found(&mut state, EntityType::Vehicle, vehicle.id, vehicle.registration_number);
                return Ok(state);
            }
            Ok(None) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    let label = label_hint(&state).or_else(|| {
        state.param_str("registration_number").map(str::to_string)
    });
    if let Some(label) = label {
        match VehicleRepository::find_by_registration(&ctx.db, &label).await {
            Ok(matches) if matches.len() == 1 => {
                let vehicle = &matches[0];
                found(
                    &mut state,
                    EntityType::Vehicle,
                    vehicle.id,
                    vehicle.registration_number.clone(),
                );
                return Ok(state);
            }
            Ok(matches) if matches.len() > 1 => {
                ambiguous(
                    &mut state,
                    &label,
                    matches
                        .iter()
                        .map(|v| ClarificationOption {
                            id: v.id.to_string(),
                            label: v.registration_number.clone(),
                            description: format!("capacity {}", v.capacity),
                        })
                        .collect(),
                );
                return Ok(state);
            }
            Ok(_) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    not_found(&mut state, ErrorKind::VehicleNotFound, "vehicle");
    Ok(state)
}

async fn resolve_driver(ctx: &AgentContext, mut state: FlowState) -> flow_core::Result<FlowState> {
    if let Some(driver_id) = state.param_i64("driver_id") {
        match DriverRepository::get_by_id(&ctx.db, driver_id, ctx.drivers_have_status).await {
            Ok(Some(driver)) => {
                found(&mut state, EntityType::Driver, driver.id, driver.name);
                return Ok(state);
            }
            Ok(None) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    let label = label_hint(&state).or_else(|| state.param_str("name").map(str::to_string));
    if let Some(label) = label {
        match DriverRepository::find_by_name(&ctx.db, &label, ctx.drivers_have_status).await {
            Ok(matches) if matches.len() == 1 => {
                let driver = &matches[0];
                found(&mut state, EntityType::Driver, driver.id, driver.name.clone());
                return Ok(state);
            }
            Ok(matches) if matches.len() > 1 => {
                ambiguous(
                    &mut state,
                    &label,
                    matches
                        .iter()
                        .map(|d| ClarificationOption {
                            id: d.id.to_string(),
                            label: d.name.clone(),
                            description: format!("shift {} - {}", d.shift_start, d.shift_end),
                        })
                        .collect(),
                );
                return Ok(state);
            }
            Ok(_) => {}
            Err(e) => {
                state.set_error(ErrorKind::DatabaseError, e.to_string());
                state.resolve_result = Some(ResolveOutcome::NotFound);
                return Ok(state);
            }
        }
    }
    not_found(&mut state, ErrorKind::DriverNotFound, "driver");
    Ok(state)
}

fn label_hint(state: &FlowState) -> Option<String> {
    state
        .intent
        .target_label
        .clone()
        .or_else(|| state.param_str("target").map(str::to_string))
        .or_else(|| state.param_str("label").map(str::to_string))
}

fn found(state: &mut FlowState, entity_type: EntityType, entity_id: i64, label: String) {
    debug!(entity = entity_type.as_str(), id = entity_id, "target resolved");
    state.resolved = Some(ResolvedTarget {
        entity_type,
        entity_id,
        label,
    });
    state.resolve_result = Some(ResolveOutcome::Found);
}

fn not_found(state: &mut FlowState, kind: ErrorKind, noun: &str) {
    state.resolve_result = Some(ResolveOutcome::NotFound);
    state.set_error(
        kind,
        format!(
            "I couldn't find the {} you meant. Try the exact name as it appears in the UI.",
            noun
        ),
    );
}

fn ambiguous(state: &mut FlowState, label: &str, options: Vec<ClarificationOption>) {
    state.resolve_result = Some(ResolveOutcome::Ambiguous);
    state.needs_clarification = true;
    state.clarification_options = options;
    state.reply = Some(format!("Several entries match '{}'. Which one?", label));
}

/// Extract a target label from free text: `from <label>`, `cancel
/// <label>`, `to <label>`
fn extract_label(text: &str) -> Option<String> {
    let patterns = [
        r"(?i)\bfrom\s+(.+)$",
        r"(?i)^cancel\s+(?:trip\s+)?(.+)$",
        r"(?i)\bto\s+(.+)$",
    ];
    for pattern in patterns {
        let regex = Regex::new(pattern).expect("Invalid extraction pattern");
        if let Some(captures) = regex.captures(text) {
            let label = captures
                .get(1)
                .map(|m| m.as_str().trim().trim_matches(|c| c == '"' || c == '\''))
                .unwrap_or_default();
            if !label.is_empty() {
                return Some(label.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_label() {
        assert_eq!(
            extract_label("remove vehicle from Path-1 - 07:00").as_deref(),
            Some("Path-1 - 07:00")
        );
        assert_eq!(
            extract_label("cancel 'Bulk - 00:01'").as_deref(),
            Some("Bulk - 00:01")
        );
        assert_eq!(extract_label("do something else").as_deref(), None);
    }
}
