//! Tool catalog: typed database operations behind the action table
//!
//! Every action in the catalog maps to one handler with the fixed
//! signature `ToolInvocation -> ExecutionResult`. Handlers own parameter
//! coercion beyond what the executor does, produce tagged `{type, data}`
//! payloads for the UI, and write exactly one audit entry per successful
//! mutation.

mod booking;
mod driver;
mod insight;
mod meta;
mod network;
mod trip;
mod vehicle;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::catalog::actions;
use crate::db::DatabasePool;
use crate::error::{AgentError, ErrorKind, Result};
use crate::state::{EntityType, ExecutionResult, ResolvedTarget};

/// One tool call: everything a handler may use
#[derive(Clone)]
pub struct ToolInvocation {
    /// Database pool
    pub db: DatabasePool,
    /// Acting user
    pub user_id: i64,
    /// Action being executed
    pub action: String,
    /// Resolver output, when the action has a target
    pub resolved: Option<ResolvedTarget>,
    /// Action-specific parameters
    pub parameters: Map<String, Value>,
    /// Boot-time introspection: drivers table carries a status column
    pub drivers_have_status: bool,
}

impl ToolInvocation {
    /// Required integer parameter, coercing integer-looking strings
    pub fn require_i64(&self, key: &str) -> Result<i64> {
        match self.parameters.get(key) {
            None => Err(AgentError::domain(
                ErrorKind::MissingParameters,
                format!("missing required parameter '{}'", key),
            )),
            Some(value) => coerce_i64(value).ok_or_else(|| {
                AgentError::domain(
                    ErrorKind::InvalidParameters,
                    format!("parameter '{}' must be an integer", key),
                )
            }),
        }
    }

    /// Optional integer parameter
    pub fn opt_i64(&self, key: &str) -> Option<i64> {
        self.parameters.get(key).and_then(coerce_i64)
    }

    /// Required string parameter
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.parameters
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                AgentError::domain(
                    ErrorKind::MissingParameters,
                    format!("missing required parameter '{}'", key),
                )
            })
    }

    /// Optional string parameter
    pub fn opt_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// Resolved id of the expected entity type
    pub fn resolved_id(&self, entity_type: EntityType) -> Option<i64> {
        match &self.resolved {
            Some(target) if target.entity_type == entity_type => Some(target.entity_id),
            _ => None,
        }
    }

    /// Target trip id: resolver output first, `trip_id` parameter second
    pub fn trip_id(&self) -> Result<i64> {
        self.resolved_id(EntityType::Trip)
            .or_else(|| self.opt_i64("trip_id"))
            .ok_or_else(|| {
                AgentError::domain(ErrorKind::TripNotFound, "no target trip was resolved")
            })
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Tagged payload constructors
///
/// Data payloads already carrying a `{type, data}` shape are passed
/// through to the UI unchanged, so these are the only place the shape is
/// built.
pub mod payload {
    use super::*;

    /// Rows for the UI to render as a table
    pub fn table<T: serde::Serialize>(rows: &T) -> Value {
        json!({"type": "table", "data": rows})
    }

    /// A single record
    pub fn object<T: serde::Serialize>(record: &T) -> Value {
        json!({"type": "object", "data": record})
    }

    /// A flat list of strings
    pub fn list(items: &[String]) -> Value {
        json!({"type": "list", "data": items})
    }

    /// Help text
    pub fn help(text: &str) -> Value {
        json!({"type": "help", "data": text})
    }
}

/// Boxed future returned by tool handlers
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send>>;

/// Type-erased tool handler
pub type ToolHandler = Arc<dyn Fn(ToolInvocation) -> ToolFuture + Send + Sync>;

/// Handler table keyed by action name
pub struct ToolRegistry {
    handlers: HashMap<&'static str, ToolHandler>,
}

impl ToolRegistry {
    /// Build the standard registry covering the whole catalog
    pub fn standard() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };

        // Trip
        registry.register(actions::ASSIGN_VEHICLE, trip::assign_vehicle);
        registry.register(actions::ASSIGN_DRIVER, trip::assign_driver);
        registry.register(actions::REMOVE_VEHICLE, trip::remove_vehicle);
        registry.register(actions::REMOVE_DRIVER, trip::remove_driver);
        registry.register(actions::CANCEL_TRIP, trip::cancel_trip);
        registry.register(actions::UPDATE_TRIP_TIME, trip::update_trip_time);
        registry.register(actions::UPDATE_TRIP_STATUS, trip::update_trip_status);
        registry.register(actions::DELAY_TRIP, trip::delay_trip);
        registry.register(actions::RESCHEDULE_TRIP, trip::reschedule_trip);
        registry.register(actions::GET_TRIP_STATUS, trip::get_trip_status);
        registry.register(actions::GET_TRIP_DETAILS, trip::get_trip_details);
        registry.register(actions::GET_TRIP_BOOKINGS, trip::get_trip_bookings);
        registry.register(actions::CHECK_TRIP_READINESS, trip::check_trip_readiness);
        registry.register(actions::DUPLICATE_TRIP, trip::duplicate_trip);
        registry.register(actions::CREATE_FOLLOWUP_TRIP, trip::create_followup_trip);

        // Vehicle
        registry.register(actions::LIST_ALL_VEHICLES, vehicle::list_all_vehicles);
        registry.register(actions::GET_UNASSIGNED_VEHICLES, vehicle::get_unassigned_vehicles);
        registry.register(actions::GET_VEHICLE_STATUS, vehicle::get_vehicle_status);
        registry.register(actions::GET_VEHICLE_TRIPS_TODAY, vehicle::get_vehicle_trips_today);
        registry.register(actions::BLOCK_VEHICLE, vehicle::block_vehicle);
        registry.register(actions::UNBLOCK_VEHICLE, vehicle::unblock_vehicle);
        registry.register(actions::ADD_VEHICLE, vehicle::add_vehicle);
        registry.register(actions::RECOMMEND_VEHICLE_FOR_TRIP, vehicle::recommend_vehicle_for_trip);
        registry.register(actions::SUGGEST_ALTERNATE_VEHICLE, vehicle::suggest_alternate_vehicle);

        // Driver
        registry.register(actions::LIST_ALL_DRIVERS, driver::list_all_drivers);
        registry.register(actions::GET_AVAILABLE_DRIVERS, driver::get_available_drivers);
        registry.register(actions::GET_DRIVER_STATUS, driver::get_driver_status);
        registry.register(actions::GET_DRIVER_TRIPS_TODAY, driver::get_driver_trips_today);
        registry.register(actions::SET_DRIVER_AVAILABILITY, driver::set_driver_availability);
        registry.register(actions::ADD_DRIVER, driver::add_driver);
        registry.register(actions::FIND_DRIVER_BY_NAME, driver::find_driver_by_name);

        // Booking
        registry.register(actions::GET_BOOKING_COUNT, booking::get_booking_count);
        registry.register(actions::LIST_PASSENGERS, booking::list_passengers);
        registry.register(actions::CANCEL_ALL_BOOKINGS, booking::cancel_all_bookings);
        registry.register(actions::FIND_EMPLOYEE_TRIPS, booking::find_employee_trips);

        // Configuration
        registry.register(actions::LIST_ALL_STOPS, network::list_all_stops);
        registry.register(actions::CREATE_STOP, network::create_stop);
        registry.register(actions::RENAME_STOP, network::rename_stop);
        registry.register(actions::DELETE_STOP, network::delete_stop);
        registry.register(actions::LIST_STOPS_FOR_PATH, network::list_stops_for_path);
        registry.register(actions::CREATE_PATH, network::create_path);
        registry.register(actions::UPDATE_PATH_STOPS, network::update_path_stops);
        registry.register(actions::DELETE_PATH, network::delete_path);
        registry.register(actions::LIST_ALL_PATHS, network::list_all_paths);
        registry.register(actions::LIST_ROUTES_USING_PATH, network::list_routes_using_path);
        registry.register(actions::CREATE_ROUTE, network::create_route);
        registry.register(actions::DUPLICATE_ROUTE, network::duplicate_route);
        registry.register(actions::DELETE_ROUTE, network::delete_route);
        registry.register(actions::LIST_ALL_ROUTES, network::list_all_routes);
        registry.register(actions::VALIDATE_ROUTE, network::validate_route);

        // Dashboard intelligence
        registry.register(actions::GET_TRIPS_NEEDING_ATTENTION, insight::get_trips_needing_attention);
        registry.register(actions::GET_TODAY_SUMMARY, insight::get_today_summary);
        registry.register(actions::GET_RECENT_CHANGES, insight::get_recent_changes);
        registry.register(actions::GET_HIGH_DEMAND_OFFICES, insight::get_high_demand_offices);
        registry.register(actions::GET_MOST_USED_VEHICLES, insight::get_most_used_vehicles);
        registry.register(actions::DETECT_OVERBOOKING, insight::detect_overbooking);
        registry.register(actions::PREDICT_PROBLEM_TRIPS, insight::predict_problem_trips);

        // Meta
        registry.register(actions::SIMULATE_ACTION, meta::simulate_action);
        registry.register(actions::EXPLAIN_DECISION, meta::explain_decision);
        registry.register(actions::CREATE_NEW_ROUTE_HELP, meta::create_new_route_help);

        registry
    }

    /// Register one handler
    fn register<F, Fut>(&mut self, name: &'static str, handler: F)
    where
        F: Fn(ToolInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ExecutionResult>> + Send + 'static,
    {
        self.handlers.insert(
            name,
            Arc::new(move |invocation| -> ToolFuture { Box::pin(handler(invocation)) }),
        );
    }

    /// Whether a handler exists for an action
    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Dispatch one invocation to its handler
    pub async fn dispatch(&self, invocation: ToolInvocation) -> Result<ExecutionResult> {
        let handler = self
            .handlers
            .get(invocation.action.as_str())
            .cloned()
            .ok_or_else(|| {
                AgentError::domain(
                    ErrorKind::UnknownAction,
                    format!("no tool implements '{}'", invocation.action),
                )
            })?;
        handler(invocation).await
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionCatalog;

    #[test]
    fn test_every_executable_action_has_a_handler() {
        let registry = ToolRegistry::standard();
        let catalog = ActionCatalog::standard();
        for spec in catalog.iter() {
            // unknown and context_mismatch never reach the executor.
            if spec.name == actions::UNKNOWN || spec.name == actions::CONTEXT_MISMATCH {
                continue;
            }
            assert!(
                registry.contains(spec.name),
                "no tool registered for '{}'",
                spec.name
            );
        }
    }

    #[test]
    fn test_payload_shapes() {
        let table = payload::table(&vec![1, 2, 3]);
        assert_eq!(table["type"], "table");
        let help = payload::help("how to");
        assert_eq!(help["type"], "help");
        assert_eq!(help["data"], "how to");
    }
}
