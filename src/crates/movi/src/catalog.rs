//! Action catalog
//!
//! The immutable table of everything the agent can do. Each entry
//! declares its category, risk class, page requirement, expected target
//! entity and required parameters; the parser, resolver, consequence
//! checker and executor all consult the same table. Adding an action is a
//! table entry plus a tool handler; no runtime changes.

use std::collections::HashMap;

use crate::state::{EntityType, Page};

/// Action name constants
///
/// Kept as string constants rather than an enum so that the catalog and
/// the tool registry stay plain tables keyed by name.
pub mod actions {
    // Trip
    pub const ASSIGN_VEHICLE: &str = "assign_vehicle";
    pub const ASSIGN_DRIVER: &str = "assign_driver";
    pub const REMOVE_VEHICLE: &str = "remove_vehicle";
    pub const REMOVE_DRIVER: &str = "remove_driver";
    pub const CANCEL_TRIP: &str = "cancel_trip";
    pub const UPDATE_TRIP_TIME: &str = "update_trip_time";
    pub const UPDATE_TRIP_STATUS: &str = "update_trip_status";
    pub const DELAY_TRIP: &str = "delay_trip";
    pub const RESCHEDULE_TRIP: &str = "reschedule_trip";
    pub const GET_TRIP_STATUS: &str = "get_trip_status";
    pub const GET_TRIP_DETAILS: &str = "get_trip_details";
    pub const GET_TRIP_BOOKINGS: &str = "get_trip_bookings";
    pub const CHECK_TRIP_READINESS: &str = "check_trip_readiness";
    pub const DUPLICATE_TRIP: &str = "duplicate_trip";
    pub const CREATE_FOLLOWUP_TRIP: &str = "create_followup_trip";

    // Vehicle
    pub const LIST_ALL_VEHICLES: &str = "list_all_vehicles";
    pub const GET_UNASSIGNED_VEHICLES: &str = "get_unassigned_vehicles";
    pub const GET_VEHICLE_STATUS: &str = "get_vehicle_status";
    pub const GET_VEHICLE_TRIPS_TODAY: &str = "get_vehicle_trips_today";
    pub const BLOCK_VEHICLE: &str = "block_vehicle";
    pub const UNBLOCK_VEHICLE: &str = "unblock_vehicle";
    pub const ADD_VEHICLE: &str = "add_vehicle";
    pub const RECOMMEND_VEHICLE_FOR_TRIP: &str = "recommend_vehicle_for_trip";
    pub const SUGGEST_ALTERNATE_VEHICLE: &str = "suggest_alternate_vehicle";

    // Driver
    pub const LIST_ALL_DRIVERS: &str = "list_all_drivers";
    pub const GET_AVAILABLE_DRIVERS: &str = "get_available_drivers";
    pub const GET_DRIVER_STATUS: &str = "get_driver_status";
    pub const GET_DRIVER_TRIPS_TODAY: &str = "get_driver_trips_today";
    pub const SET_DRIVER_AVAILABILITY: &str = "set_driver_availability";
    pub const ADD_DRIVER: &str = "add_driver";
    pub const FIND_DRIVER_BY_NAME: &str = "find_driver_by_name";

    // Booking
    pub const GET_BOOKING_COUNT: &str = "get_booking_count";
    pub const LIST_PASSENGERS: &str = "list_passengers";
    pub const CANCEL_ALL_BOOKINGS: &str = "cancel_all_bookings";
    pub const FIND_EMPLOYEE_TRIPS: &str = "find_employee_trips";

    // Configuration
    pub const LIST_ALL_STOPS: &str = "list_all_stops";
    pub const CREATE_STOP: &str = "create_stop";
    pub const RENAME_STOP: &str = "rename_stop";
    pub const DELETE_STOP: &str = "delete_stop";
    pub const LIST_STOPS_FOR_PATH: &str = "list_stops_for_path";
    pub const CREATE_PATH: &str = "create_path";
    pub const UPDATE_PATH_STOPS: &str = "update_path_stops";
    pub const DELETE_PATH: &str = "delete_path";
    pub const LIST_ALL_PATHS: &str = "list_all_paths";
    pub const LIST_ROUTES_USING_PATH: &str = "list_routes_using_path";
    pub const CREATE_ROUTE: &str = "create_route";
    pub const DUPLICATE_ROUTE: &str = "duplicate_route";
    pub const DELETE_ROUTE: &str = "delete_route";
    pub const LIST_ALL_ROUTES: &str = "list_all_routes";
    pub const VALIDATE_ROUTE: &str = "validate_route";

    // Dashboard intelligence
    pub const GET_TRIPS_NEEDING_ATTENTION: &str = "get_trips_needing_attention";
    pub const GET_TODAY_SUMMARY: &str = "get_today_summary";
    pub const GET_RECENT_CHANGES: &str = "get_recent_changes";
    pub const GET_HIGH_DEMAND_OFFICES: &str = "get_high_demand_offices";
    pub const GET_MOST_USED_VEHICLES: &str = "get_most_used_vehicles";
    pub const DETECT_OVERBOOKING: &str = "detect_overbooking";
    pub const PREDICT_PROBLEM_TRIPS: &str = "predict_problem_trips";

    // Meta
    pub const SIMULATE_ACTION: &str = "simulate_action";
    pub const EXPLAIN_DECISION: &str = "explain_decision";
    pub const CREATE_NEW_ROUTE_HELP: &str = "create_new_route_help";
    pub const CONTEXT_MISMATCH: &str = "context_mismatch";
    pub const UNKNOWN: &str = "unknown";
}

/// What an action does to the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    /// Read-only
    Query,
    /// Writes domain rows
    Mutate,
    /// Starts a multi-step wizard
    Wizard,
    /// Help/meta, no domain access
    Helper,
}

/// Whether an action needs a confirmed session before mutating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskClass {
    Safe,
    Risky,
}

/// UI page the action is allowed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequirement {
    Dashboard,
    ManageRoute,
    Any,
}

impl PageRequirement {
    /// Whether the action may run given the caller's page context
    ///
    /// The check is skipped when the caller supplies no page (non-UI
    /// callers).
    pub fn allows(&self, page: Option<Page>) -> bool {
        match (self, page) {
            (PageRequirement::Any, _) | (_, None) => true,
            (PageRequirement::Dashboard, Some(p)) => p == Page::Dashboard,
            (PageRequirement::ManageRoute, Some(p)) => p == Page::ManageRoute,
        }
    }

    /// Name of the required page for mismatch messages
    pub fn required_page_name(&self) -> &'static str {
        match self {
            PageRequirement::Dashboard => "dashboard",
            PageRequirement::ManageRoute => "manageRoute",
            PageRequirement::Any => "any",
        }
    }
}

/// Entity category an action's target resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Target-free action; the resolver is skipped
    None,
    Trip,
    Vehicle,
    Driver,
    Stop,
    Path,
    Route,
}

impl TargetKind {
    /// Corresponding resolved entity type, when there is one
    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            TargetKind::None => None,
            TargetKind::Trip => Some(EntityType::Trip),
            TargetKind::Vehicle => Some(EntityType::Vehicle),
            TargetKind::Driver => Some(EntityType::Driver),
            TargetKind::Stop => Some(EntityType::Stop),
            TargetKind::Path => Some(EntityType::Path),
            TargetKind::Route => Some(EntityType::Route),
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone)]
pub struct ActionSpec {
    /// Canonical name
    pub name: &'static str,
    /// Category
    pub category: ActionCategory,
    /// Risk class
    pub risk: RiskClass,
    /// Page requirement
    pub page: PageRequirement,
    /// Expected target entity
    pub target: TargetKind,
    /// Parameters the executor requires (beyond the resolved target)
    pub required_parameters: &'static [&'static str],
    /// One-line description, used in the model prompt
    pub description: &'static str,
}

/// The immutable action table
pub struct ActionCatalog {
    specs: HashMap<&'static str, ActionSpec>,
    order: Vec<&'static str>,
}

impl ActionCatalog {
    /// Build the standard catalog
    pub fn standard() -> Self {
        use actions::*;
        use ActionCategory::*;
        use PageRequirement as Pg;
        use RiskClass::*;
        use TargetKind as Tg;

        let mut catalog = Self {
            specs: HashMap::new(),
            order: Vec::new(),
        };
        let mut add = |spec: ActionSpec| {
            catalog.order.push(spec.name);
            catalog.specs.insert(spec.name, spec);
        };

        // Trip
        add(ActionSpec { name: ASSIGN_VEHICLE, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &["vehicle_id"], description: "Assign a vehicle to a trip" });
        add(ActionSpec { name: ASSIGN_DRIVER, category: Mutate, risk: Safe, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &["driver_id"], description: "Assign a driver to a trip" });
        add(ActionSpec { name: REMOVE_VEHICLE, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &[], description: "Remove the vehicle from a trip" });
        add(ActionSpec { name: REMOVE_DRIVER, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &[], description: "Remove the driver from a trip" });
        add(ActionSpec { name: CANCEL_TRIP, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &[], description: "Cancel a trip" });
        add(ActionSpec { name: UPDATE_TRIP_TIME, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &["new_time"], description: "Change a trip's scheduled time" });
        add(ActionSpec { name: UPDATE_TRIP_STATUS, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &["new_status"], description: "Set a trip's lifecycle status" });
        add(ActionSpec { name: DELAY_TRIP, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &["delay_minutes"], description: "Delay a trip by some minutes" });
        add(ActionSpec { name: RESCHEDULE_TRIP, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &["new_date"], description: "Move a trip to another date" });
        add(ActionSpec { name: GET_TRIP_STATUS, category: Query, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &[], description: "Current status of a trip" });
        add(ActionSpec { name: GET_TRIP_DETAILS, category: Query, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &[], description: "Full details of a trip" });
        add(ActionSpec { name: GET_TRIP_BOOKINGS, category: Query, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &[], description: "Bookings on a trip" });
        add(ActionSpec { name: CHECK_TRIP_READINESS, category: Query, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &[], description: "Whether a trip has vehicle, driver and capacity" });
        add(ActionSpec { name: DUPLICATE_TRIP, category: Mutate, risk: Safe, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &[], description: "Clone a trip to a new row" });
        add(ActionSpec { name: CREATE_FOLLOWUP_TRIP, category: Wizard, risk: Safe, page: Pg::ManageRoute, target: Tg::None, required_parameters: &[], description: "Create a trip via the guided wizard" });

        // Vehicle
        add(ActionSpec { name: LIST_ALL_VEHICLES, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "List every vehicle" });
        add(ActionSpec { name: GET_UNASSIGNED_VEHICLES, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Vehicles without a deployment today" });
        add(ActionSpec { name: GET_VEHICLE_STATUS, category: Query, risk: Safe, page: Pg::Any, target: Tg::Vehicle, required_parameters: &[], description: "Status of a vehicle" });
        add(ActionSpec { name: GET_VEHICLE_TRIPS_TODAY, category: Query, risk: Safe, page: Pg::Any, target: Tg::Vehicle, required_parameters: &[], description: "Today's trips for a vehicle" });
        add(ActionSpec { name: BLOCK_VEHICLE, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Vehicle, required_parameters: &[], description: "Take a vehicle out of service" });
        add(ActionSpec { name: UNBLOCK_VEHICLE, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Vehicle, required_parameters: &[], description: "Return a vehicle to service" });
        add(ActionSpec { name: ADD_VEHICLE, category: Mutate, risk: Safe, page: Pg::Dashboard, target: Tg::None, required_parameters: &["registration_number"], description: "Register a new vehicle" });
        add(ActionSpec { name: RECOMMEND_VEHICLE_FOR_TRIP, category: Query, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &[], description: "Best available vehicle for a trip" });
        add(ActionSpec { name: SUGGEST_ALTERNATE_VEHICLE, category: Query, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &[], description: "Alternative vehicle for a trip" });

        // Driver
        add(ActionSpec { name: LIST_ALL_DRIVERS, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "List every driver" });
        add(ActionSpec { name: GET_AVAILABLE_DRIVERS, category: Query, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &[], description: "Drivers free for a trip" });
        add(ActionSpec { name: GET_DRIVER_STATUS, category: Query, risk: Safe, page: Pg::Any, target: Tg::Driver, required_parameters: &[], description: "Status of a driver" });
        add(ActionSpec { name: GET_DRIVER_TRIPS_TODAY, category: Query, risk: Safe, page: Pg::Any, target: Tg::Driver, required_parameters: &[], description: "Today's trips for a driver" });
        add(ActionSpec { name: SET_DRIVER_AVAILABILITY, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Driver, required_parameters: &["available"], description: "Mark a driver available or unavailable" });
        add(ActionSpec { name: ADD_DRIVER, category: Mutate, risk: Safe, page: Pg::Dashboard, target: Tg::None, required_parameters: &["name"], description: "Register a new driver" });
        add(ActionSpec { name: FIND_DRIVER_BY_NAME, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &["name"], description: "Look a driver up by name" });

        // Booking
        add(ActionSpec { name: GET_BOOKING_COUNT, category: Query, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &[], description: "Active booking count for a trip" });
        add(ActionSpec { name: LIST_PASSENGERS, category: Query, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &[], description: "Passenger list for a trip" });
        add(ActionSpec { name: CANCEL_ALL_BOOKINGS, category: Mutate, risk: Risky, page: Pg::Dashboard, target: Tg::Trip, required_parameters: &[], description: "Cancel every booking on a trip" });
        add(ActionSpec { name: FIND_EMPLOYEE_TRIPS, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &["employee_name"], description: "Trips an employee is booked on" });

        // Configuration
        add(ActionSpec { name: LIST_ALL_STOPS, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "List every stop" });
        add(ActionSpec { name: CREATE_STOP, category: Mutate, risk: Safe, page: Pg::ManageRoute, target: Tg::None, required_parameters: &["name"], description: "Create a stop" });
        add(ActionSpec { name: RENAME_STOP, category: Mutate, risk: Safe, page: Pg::ManageRoute, target: Tg::Stop, required_parameters: &["new_name"], description: "Rename a stop" });
        add(ActionSpec { name: DELETE_STOP, category: Mutate, risk: Risky, page: Pg::ManageRoute, target: Tg::Stop, required_parameters: &[], description: "Delete a stop" });
        add(ActionSpec { name: LIST_STOPS_FOR_PATH, category: Query, risk: Safe, page: Pg::Any, target: Tg::Path, required_parameters: &[], description: "Ordered stops of a path" });
        add(ActionSpec { name: CREATE_PATH, category: Wizard, risk: Safe, page: Pg::ManageRoute, target: Tg::None, required_parameters: &[], description: "Create a path via the guided wizard" });
        add(ActionSpec { name: UPDATE_PATH_STOPS, category: Mutate, risk: Risky, page: Pg::ManageRoute, target: Tg::Path, required_parameters: &["stop_ids"], description: "Replace the ordered stops of a path" });
        add(ActionSpec { name: DELETE_PATH, category: Mutate, risk: Risky, page: Pg::ManageRoute, target: Tg::Path, required_parameters: &[], description: "Delete a path" });
        add(ActionSpec { name: LIST_ALL_PATHS, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "List every path" });
        add(ActionSpec { name: LIST_ROUTES_USING_PATH, category: Query, risk: Safe, page: Pg::Any, target: Tg::Path, required_parameters: &[], description: "Routes built on a path" });
        add(ActionSpec { name: CREATE_ROUTE, category: Wizard, risk: Safe, page: Pg::ManageRoute, target: Tg::None, required_parameters: &[], description: "Create a route via the guided wizard" });
        add(ActionSpec { name: DUPLICATE_ROUTE, category: Mutate, risk: Safe, page: Pg::ManageRoute, target: Tg::Route, required_parameters: &[], description: "Clone a route" });
        add(ActionSpec { name: DELETE_ROUTE, category: Mutate, risk: Risky, page: Pg::ManageRoute, target: Tg::Route, required_parameters: &[], description: "Delete a route" });
        add(ActionSpec { name: LIST_ALL_ROUTES, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "List every route" });
        add(ActionSpec { name: VALIDATE_ROUTE, category: Query, risk: Safe, page: Pg::Any, target: Tg::Route, required_parameters: &[], description: "Check a route's configuration is complete" });

        // Dashboard intelligence
        add(ActionSpec { name: GET_TRIPS_NEEDING_ATTENTION, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Today's trips missing vehicle or driver" });
        add(ActionSpec { name: GET_TODAY_SUMMARY, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Operational summary for today" });
        add(ActionSpec { name: GET_RECENT_CHANGES, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Recent audit-log entries" });
        add(ActionSpec { name: GET_HIGH_DEMAND_OFFICES, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Offices generating the most bookings" });
        add(ActionSpec { name: GET_MOST_USED_VEHICLES, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Vehicles with the most deployments" });
        add(ActionSpec { name: DETECT_OVERBOOKING, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Trips with more bookings than seats" });
        add(ActionSpec { name: PREDICT_PROBLEM_TRIPS, category: Query, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Trips likely to have trouble today" });

        // Meta
        add(ActionSpec { name: SIMULATE_ACTION, category: Helper, risk: Safe, page: Pg::Any, target: Tg::Trip, required_parameters: &["action"], description: "Preview the consequences of an action without running it" });
        add(ActionSpec { name: EXPLAIN_DECISION, category: Helper, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Explain the agent's last decision" });
        add(ActionSpec { name: CREATE_NEW_ROUTE_HELP, category: Helper, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "How to create a new route" });
        add(ActionSpec { name: CONTEXT_MISMATCH, category: Helper, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Action rejected by page gating" });
        add(ActionSpec { name: UNKNOWN, category: Helper, risk: Safe, page: Pg::Any, target: Tg::None, required_parameters: &[], description: "Unclassified input" });

        catalog
    }

    /// Look an action up by name
    pub fn get(&self, name: &str) -> Option<&ActionSpec> {
        self.specs.get(name)
    }

    /// Whether the catalog contains an action
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Whether an action is classified risky
    pub fn is_risky(&self, name: &str) -> bool {
        self.get(name)
            .map(|spec| spec.risk == RiskClass::Risky)
            .unwrap_or(false)
    }

    /// Actions in registration order (stable prompt ordering)
    pub fn iter(&self) -> impl Iterator<Item = &ActionSpec> {
        self.order.iter().filter_map(|name| self.specs.get(name))
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Map a synonym phrase onto a catalog action
    ///
    /// Fixed table applied to the model's raw action string before any
    /// similarity matching.
    pub fn synonym(&self, raw: &str) -> Option<&'static str> {
        use actions::*;
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        let mapped = match normalized.as_str() {
            "allocate" | "allocate_driver" | "appoint" | "appoint_driver" | "give_driver"
            | "send_driver" | "reserve_driver" => ASSIGN_DRIVER,
            "allocate_vehicle" | "give_vehicle" | "send_vehicle" | "reserve_vehicle"
            | "add_vehicle_to_trip" => ASSIGN_VEHICLE,
            "delete_trip" | "abort" | "abort_trip" | "remove_trip" => CANCEL_TRIP,
            "unassign_vehicle" | "drop_vehicle" => REMOVE_VEHICLE,
            "unassign_driver" | "drop_driver" => REMOVE_DRIVER,
            "change_trip_time" | "move_trip_time" | "change_time" => UPDATE_TRIP_TIME,
            "postpone" | "postpone_trip" | "push_trip" => DELAY_TRIP,
            "list_stops" | "show_stops" | "show_all_stops" => LIST_ALL_STOPS,
            "list_vehicles" | "show_vehicles" => LIST_ALL_VEHICLES,
            "list_drivers" | "show_drivers" => LIST_ALL_DRIVERS,
            "list_routes" | "show_routes" => LIST_ALL_ROUTES,
            "list_paths" | "show_paths" => LIST_ALL_PATHS,
            "new_stop" | "add_stop" => CREATE_STOP,
            "new_path" | "add_path" => CREATE_PATH,
            "new_route" | "add_route" => CREATE_ROUTE,
            "new_trip" | "add_trip" | "create_trip" => CREATE_FOLLOWUP_TRIP,
            "today_summary" | "daily_summary" => GET_TODAY_SUMMARY,
            _ => return None,
        };
        Some(mapped)
    }

    /// Best catalog match for an out-of-catalog action name
    ///
    /// Returns the closest name and its similarity in [0, 1]; the caller
    /// applies the acceptance threshold.
    pub fn closest_match(&self, raw: &str) -> Option<(&'static str, f64)> {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        self.order
            .iter()
            .map(|name| (*name, crate::intent::similarity(&normalized, name)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_size_and_membership() {
        let catalog = ActionCatalog::standard();
        assert!(catalog.len() >= 55);
        assert!(catalog.contains(actions::ASSIGN_VEHICLE));
        assert!(catalog.contains(actions::PREDICT_PROBLEM_TRIPS));
        assert!(!catalog.contains("launch_rocket"));
    }

    #[test]
    fn test_risk_classes() {
        let catalog = ActionCatalog::standard();
        assert!(catalog.is_risky(actions::CANCEL_TRIP));
        assert!(catalog.is_risky(actions::DELETE_PATH));
        // assign_driver is safe; the 90-minute conflict check lives in the
        // selection provider instead.
        assert!(!catalog.is_risky(actions::ASSIGN_DRIVER));
        assert!(!catalog.is_risky(actions::CREATE_STOP));
        assert!(!catalog.is_risky(actions::DUPLICATE_ROUTE));
    }

    #[test]
    fn test_page_requirements() {
        let catalog = ActionCatalog::standard();
        let cancel = catalog.get(actions::CANCEL_TRIP).unwrap();
        assert!(cancel.page.allows(Some(Page::Dashboard)));
        assert!(!cancel.page.allows(Some(Page::ManageRoute)));
        // No page context bypasses gating.
        assert!(cancel.page.allows(None));

        let create_route = catalog.get(actions::CREATE_ROUTE).unwrap();
        assert!(!create_route.page.allows(Some(Page::Dashboard)));
        assert!(create_route.page.allows(Some(Page::ManageRoute)));
    }

    #[test]
    fn test_synonyms() {
        let catalog = ActionCatalog::standard();
        assert_eq!(catalog.synonym("allocate driver"), Some(actions::ASSIGN_DRIVER));
        assert_eq!(catalog.synonym("delete trip"), Some(actions::CANCEL_TRIP));
        assert_eq!(catalog.synonym("abort"), Some(actions::CANCEL_TRIP));
        assert_eq!(catalog.synonym("nonsense"), None);
    }

    #[test]
    fn test_closest_match_finds_near_misses() {
        let catalog = ActionCatalog::standard();
        let (name, score) = catalog.closest_match("cancel_trips").unwrap();
        assert_eq!(name, actions::CANCEL_TRIP);
        assert!(score >= 0.85);
    }

    #[test]
    fn test_target_kinds() {
        let catalog = ActionCatalog::standard();
        assert_eq!(catalog.get(actions::LIST_STOPS_FOR_PATH).unwrap().target, TargetKind::Path);
        assert_eq!(catalog.get(actions::LIST_ALL_STOPS).unwrap().target, TargetKind::None);
        assert_eq!(catalog.get(actions::CANCEL_TRIP).unwrap().target, TargetKind::Trip);
    }
}
