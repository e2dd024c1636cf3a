//! Wizard flows: declared step lists, validators and state
//!
//! Four guided flows collect parameters one step at a time: trip, route,
//! path and stop creation. A wizard's state is persisted in its session
//! between turns; the wizard node replays it, validates the user's input
//! under the current step and either re-prompts or advances.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tooling::validation::Validator;

/// Which wizard is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardFlow {
    TripCreation,
    RouteCreation,
    PathCreation,
    StopCreation,
}

impl WizardFlow {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardFlow::TripCreation => "trip_creation",
            WizardFlow::RouteCreation => "route_creation",
            WizardFlow::PathCreation => "path_creation",
            WizardFlow::StopCreation => "stop_creation",
        }
    }

    /// Wizard flow owned by an action, if any
    pub fn for_action(action: &str) -> Option<Self> {
        use crate::catalog::actions;
        match action {
            actions::CREATE_FOLLOWUP_TRIP => Some(WizardFlow::TripCreation),
            actions::CREATE_ROUTE => Some(WizardFlow::RouteCreation),
            actions::CREATE_PATH => Some(WizardFlow::PathCreation),
            actions::CREATE_STOP => Some(WizardFlow::StopCreation),
            _ => None,
        }
    }

    /// Action that owns this flow
    pub fn owning_action(&self) -> &'static str {
        use crate::catalog::actions;
        match self {
            WizardFlow::TripCreation => actions::CREATE_FOLLOWUP_TRIP,
            WizardFlow::RouteCreation => actions::CREATE_ROUTE,
            WizardFlow::PathCreation => actions::CREATE_PATH,
            WizardFlow::StopCreation => actions::CREATE_STOP,
        }
    }
}

/// Where a step's pickable options come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    /// Free-text step, no options
    None,
    /// Existing routes
    Routes,
    /// Existing paths
    Paths,
    /// Available vehicles
    Vehicles,
    /// Available drivers
    Drivers,
    /// Existing stops
    Stops,
}

/// One declared wizard step
#[derive(Debug, Clone, Copy)]
pub struct WizardStep {
    /// Key the collected value is stored under
    pub key: &'static str,
    /// Prompt shown to the user
    pub prompt: &'static str,
    /// Option list the UI should offer
    pub options: OptionSource,
}

/// Declared ordered step list for a flow
pub fn steps(flow: WizardFlow) -> &'static [WizardStep] {
    match flow {
        WizardFlow::TripCreation => &[
            WizardStep { key: "name", prompt: "What should the trip be called?", options: OptionSource::None },
            WizardStep { key: "date", prompt: "Which date? (YYYY-MM-DD)", options: OptionSource::None },
            WizardStep { key: "time", prompt: "What departure time? (HH:MM)", options: OptionSource::None },
            WizardStep { key: "route_id", prompt: "Which route should it run on?", options: OptionSource::Routes },
            WizardStep { key: "vehicle_id", prompt: "Which vehicle?", options: OptionSource::Vehicles },
            WizardStep { key: "driver_id", prompt: "Which driver?", options: OptionSource::Drivers },
            WizardStep { key: "confirm", prompt: "Create this trip? (yes/no)", options: OptionSource::None },
        ],
        WizardFlow::RouteCreation => &[
            WizardStep { key: "name", prompt: "What should the route be called?", options: OptionSource::None },
            WizardStep { key: "path_id", prompt: "Which path should it follow?", options: OptionSource::Paths },
            WizardStep { key: "shift_time", prompt: "What shift time? (HH:MM)", options: OptionSource::None },
            WizardStep { key: "direction", prompt: "Which direction? (up/down)", options: OptionSource::None },
        ],
        WizardFlow::PathCreation => &[
            WizardStep { key: "name", prompt: "What should the path be called?", options: OptionSource::None },
            WizardStep { key: "stop_ids", prompt: "List the stop ids in order, comma separated (at least 2)", options: OptionSource::Stops },
            WizardStep { key: "confirm", prompt: "Create this path? (yes/no)", options: OptionSource::None },
        ],
        WizardFlow::StopCreation => &[
            WizardStep { key: "name", prompt: "What should the stop be called?", options: OptionSource::None },
            WizardStep { key: "latitude", prompt: "Latitude?", options: OptionSource::None },
            WizardStep { key: "longitude", prompt: "Longitude?", options: OptionSource::None },
            WizardStep { key: "confirm", prompt: "Create this stop? (yes/no)", options: OptionSource::None },
        ],
    }
}

/// Persisted wizard progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardState {
    /// Which flow
    pub flow: WizardFlow,
    /// Index into the declared step list
    pub current_step: usize,
    /// Collected values keyed by step key
    pub collected: Map<String, Value>,
    /// User cancelled mid-flow
    pub cancelled: bool,
}

impl WizardState {
    /// Fresh state at the first step
    pub fn new(flow: WizardFlow) -> Self {
        Self {
            flow,
            current_step: 0,
            collected: Map::new(),
            cancelled: false,
        }
    }

    /// The current step descriptor, or `None` past the end
    pub fn step(&self) -> Option<&'static WizardStep> {
        steps(self.flow).get(self.current_step)
    }

    /// Whether every step has been satisfied
    pub fn is_complete(&self) -> bool {
        self.current_step >= steps(self.flow).len()
    }
}

/// Whether an utterance cancels the wizard
pub fn is_cancel_word(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "cancel" | "abort" | "stop" | "quit" | "nevermind" | "never mind"
    )
}

/// Validate one step's raw input
///
/// Returns the value to store under the step key, or a re-prompt message.
pub fn validate_step(flow: WizardFlow, key: &str, input: &str) -> Result<Value, String> {
    let input = input.trim();
    match key {
        "name" => Validator::new(input, "name")
            .not_empty()
            .max_length(120)
            .validate()
            .map(|v| json!(v))
            .map_err(|e| e.to_string()),
        "date" => NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .map(|_| json!(input))
            .map_err(|_| format!("'{}' is not a date; use YYYY-MM-DD", input)),
        "time" | "shift_time" => NaiveTime::parse_from_str(input, "%H:%M")
            .map(|_| json!(input))
            .map_err(|_| format!("'{}' is not a time; use HH:MM", input)),
        "route_id" | "path_id" | "vehicle_id" | "driver_id" => input
            .parse::<i64>()
            .map(|id| json!(id))
            .map_err(|_| format!("'{}' is not an id; pick one of the options", input)),
        "stop_ids" => {
            let ids: Result<Vec<i64>, _> = input
                .split(',')
                .map(|part| part.trim().parse::<i64>())
                .collect();
            match ids {
                Ok(ids) if ids.len() >= 2 => Ok(json!(ids)),
                Ok(_) => Err("a path needs at least 2 stops".to_string()),
                Err(_) => Err(format!(
                    "'{}' is not a comma-separated list of stop ids",
                    input
                )),
            }
        }
        "latitude" => input
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", input))
            .and_then(|v| {
                Validator::new(v, "latitude")
                    .range(-90.0, 90.0)
                    .validate()
                    .map(|v| json!(v))
                    .map_err(|e| e.to_string())
            }),
        "longitude" => input
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", input))
            .and_then(|v| {
                Validator::new(v, "longitude")
                    .range(-180.0, 180.0)
                    .validate()
                    .map(|v| json!(v))
                    .map_err(|e| e.to_string())
            }),
        "direction" => match input.to_lowercase().as_str() {
            "up" | "down" => Ok(json!(input.to_lowercase())),
            _ => Err("direction must be 'up' or 'down'".to_string()),
        },
        "confirm" => match input.to_lowercase().as_str() {
            "yes" | "y" | "confirm" | "ok" => Ok(json!(true)),
            "no" | "n" => Err("okay, say 'cancel' to abandon or adjust your answer".to_string()),
            _ => Err("please answer yes or no".to_string()),
        },
        other => {
            debug_assert!(false, "unknown wizard step key {other}");
            Err(format!("unknown step '{}'", other))
        }
    }
    .map_err(|message| format!("{} {}", message, reprompt_suffix(flow, key)))
}

fn reprompt_suffix(flow: WizardFlow, key: &str) -> String {
    steps(flow)
        .iter()
        .find(|step| step.key == key)
        .map(|step| step.prompt.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_step_counts() {
        assert_eq!(steps(WizardFlow::TripCreation).len(), 7);
        assert_eq!(steps(WizardFlow::RouteCreation).len(), 4);
        assert_eq!(steps(WizardFlow::PathCreation).len(), 3);
        assert_eq!(steps(WizardFlow::StopCreation).len(), 4);
    }

    #[test]
    fn test_date_and_time_validation() {
        assert!(validate_step(WizardFlow::TripCreation, "date", "2026-08-01").is_ok());
        assert!(validate_step(WizardFlow::TripCreation, "date", "01/08/2026").is_err());
        assert!(validate_step(WizardFlow::TripCreation, "time", "07:30").is_ok());
        assert!(validate_step(WizardFlow::TripCreation, "time", "7.30").is_err());
    }

    #[test]
    fn test_stop_ids_need_two() {
        assert!(validate_step(WizardFlow::PathCreation, "stop_ids", "1, 2, 3").is_ok());
        assert!(validate_step(WizardFlow::PathCreation, "stop_ids", "1").is_err());
        assert!(validate_step(WizardFlow::PathCreation, "stop_ids", "a,b").is_err());
    }

    #[test]
    fn test_coordinates_are_range_checked() {
        assert!(validate_step(WizardFlow::StopCreation, "latitude", "48.2").is_ok());
        assert!(validate_step(WizardFlow::StopCreation, "latitude", "123").is_err());
        assert!(validate_step(WizardFlow::StopCreation, "longitude", "-180").is_ok());
        assert!(validate_step(WizardFlow::StopCreation, "longitude", "190").is_err());
    }

    #[test]
    fn test_cancel_words() {
        assert!(is_cancel_word("cancel"));
        assert!(is_cancel_word("  ABORT "));
        assert!(!is_cancel_word("cancel the trip"));
    }

    #[test]
    fn test_flow_action_mapping_round_trips() {
        for flow in [
            WizardFlow::TripCreation,
            WizardFlow::RouteCreation,
            WizardFlow::PathCreation,
            WizardFlow::StopCreation,
        ] {
            assert_eq!(WizardFlow::for_action(flow.owning_action()), Some(flow));
        }
    }

    #[test]
    fn test_state_advances_to_completion() {
        let mut state = WizardState::new(WizardFlow::StopCreation);
        assert_eq!(state.step().unwrap().key, "name");
        state.current_step = 4;
        assert!(state.is_complete());
        assert!(state.step().is_none());
    }
}
