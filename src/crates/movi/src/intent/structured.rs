//! Structured command fast-path
//!
//! UI selections (driver picker, vehicle picker, confirmation buttons)
//! reach the executor deterministically through a tiny pipe-separated
//! grammar:
//!
//! ```text
//! STRUCTURED_CMD:<action>(|<key>:<value>)*
//! ```
//!
//! Values are integer literals (coerced), quoted strings (spaces
//! allowed), or barewords. Unknown keys pass straight through to the
//! parameter map, where handlers that do not use them ignore them.
//! Missing required keys fail with `missing_parameters`. No model call is
//! ever made on this path.

use serde_json::{json, Map, Value};

use crate::catalog::ActionCatalog;
use crate::error::{AgentError, ErrorKind};
use crate::state::Intent;

/// Marker prefix for structured commands
pub const STRUCTURED_PREFIX: &str = "STRUCTURED_CMD:";

/// Parse the remainder after the marker into an [`Intent`]
pub fn parse(rest: &str, catalog: &ActionCatalog) -> Result<Intent, AgentError> {
    let mut segments = rest.split('|');
    let action = segments
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AgentError::domain(ErrorKind::MissingParameters, "structured command has no action")
        })?
        .to_string();

    let spec = catalog.get(&action).ok_or_else(|| {
        AgentError::domain(
            ErrorKind::UnknownAction,
            format!("'{}' is not a known action", action),
        )
    })?;

    let mut parameters = Map::new();
    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (key, raw_value) = segment.split_once(':').ok_or_else(|| {
            AgentError::domain(
                ErrorKind::InvalidParameters,
                format!("'{}' is not a key:value pair", segment),
            )
        })?;
        parameters.insert(key.trim().to_string(), parse_value(raw_value.trim()));
    }

    let missing: Vec<&str> = spec
        .required_parameters
        .iter()
        .filter(|key| !parameters.contains_key(**key))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(AgentError::domain(
            ErrorKind::MissingParameters,
            format!("missing required parameters: {}", missing.join(", ")),
        ));
    }

    let target_trip_id = match parameters.get("trip_id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    let target_label = parameters
        .get("target")
        .or_else(|| parameters.get("label"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Intent {
        action,
        confidence: 1.0,
        parameters,
        target_label,
        target_trip_id,
        explanation: None,
    })
}

/// Integer literal, quoted string, or bareword
fn parse_value(raw: &str) -> Value {
    if let Some(quoted) = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
    {
        return json!(quoted);
    }
    if let Ok(int) = raw.parse::<i64>() {
        return json!(int);
    }
    json!(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ActionCatalog {
        ActionCatalog::standard()
    }

    #[test]
    fn test_parses_action_and_parameters() {
        let intent = parse("assign_driver|trip_id:8|driver_id:5", &catalog()).unwrap();
        assert_eq!(intent.action, "assign_driver");
        assert_eq!(intent.confidence, 1.0);
        assert_eq!(intent.parameters["driver_id"], json!(5));
        assert_eq!(intent.target_trip_id, Some(8));
    }

    #[test]
    fn test_quoted_values_keep_spaces() {
        let intent = parse(r#"create_stop|name:"Odeon Circle""#, &catalog()).unwrap();
        assert_eq!(intent.parameters["name"], json!("Odeon Circle"));
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let intent = parse("cancel_trip|trip_id:3|hue:teal", &catalog()).unwrap();
        assert_eq!(intent.parameters["hue"], json!("teal"));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = parse("launch_rocket|trip_id:3", &catalog()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAction);
    }

    #[test]
    fn test_missing_required_key() {
        let err = parse("update_trip_time|trip_id:3", &catalog()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameters);
        assert!(err.user_message().contains("new_time"));
    }

    #[test]
    fn test_label_key_becomes_target() {
        let intent = parse("cancel_trip|label:\"Path-3 - 07:30\"", &catalog()).unwrap();
        assert_eq!(intent.target_label.as_deref(), Some("Path-3 - 07:30"));
    }
}
