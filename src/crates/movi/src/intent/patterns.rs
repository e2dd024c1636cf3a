//! Regex fallback strategy
//!
//! Used only when the model path is exhausted (terminal timeout or
//! malformed JSON). A small ordered table recognises the high-value
//! actions; anything else is `unknown` with zero confidence.

use regex::Regex;
use serde_json::json;

use crate::catalog::actions;
use crate::state::Intent;

/// Confidence assigned to regex-recognised intents
const FALLBACK_CONFIDENCE: f32 = 0.6;

/// Parse free text with the fallback pattern table
pub fn fallback_parse(text: &str) -> Intent {
    let text = text.trim();
    let table: [(&str, &str); 6] = [
        (r"(?i)^cancel\s+(?:trip\s+)?(.+)$", actions::CANCEL_TRIP),
        (
            r"(?i)^remove\s+(?:the\s+)?vehicle(?:\s+from\s+(.+))?$",
            actions::REMOVE_VEHICLE,
        ),
        (
            r"(?i)^remove\s+(?:the\s+)?driver(?:\s+from\s+(.+))?$",
            actions::REMOVE_DRIVER,
        ),
        (
            r"(?i)^assign\s+(?:a\s+)?driver(?:\s+to\s+(.+))?$",
            actions::ASSIGN_DRIVER,
        ),
        (
            r"(?i)^assign\s+(?:a\s+)?vehicle(?:\s+to\s+(.+))?$",
            actions::ASSIGN_VEHICLE,
        ),
        (r"(?i)^list\s+(?:all\s+)?stops\b.*$", actions::LIST_ALL_STOPS),
    ];

    for (pattern, action) in table {
        let regex = Regex::new(pattern).expect("Invalid fallback pattern");
        if let Some(captures) = regex.captures(text) {
            let mut intent = Intent {
                action: action.to_string(),
                confidence: FALLBACK_CONFIDENCE,
                ..Intent::default()
            };
            if let Some(label) = captures.get(1).map(|m| m.as_str().trim()) {
                if !label.is_empty() {
                    intent.target_label = Some(trim_quotes(label).to_string());
                    intent
                        .parameters
                        .insert("target".to_string(), json!(trim_quotes(label)));
                }
            }
            return intent;
        }
    }

    Intent::default()
}

fn trim_quotes(label: &str) -> &str {
    label
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_with_label() {
        let intent = fallback_parse("Cancel Path-3 - 07:30");
        assert_eq!(intent.action, actions::CANCEL_TRIP);
        assert_eq!(intent.target_label.as_deref(), Some("Path-3 - 07:30"));
        assert!(intent.confidence > 0.0);
    }

    #[test]
    fn test_cancel_trip_keyword_is_stripped() {
        let intent = fallback_parse("cancel trip Bulk - 00:01");
        assert_eq!(intent.action, actions::CANCEL_TRIP);
        assert_eq!(intent.target_label.as_deref(), Some("Bulk - 00:01"));
    }

    #[test]
    fn test_remove_vehicle_without_label() {
        let intent = fallback_parse("remove vehicle");
        assert_eq!(intent.action, actions::REMOVE_VEHICLE);
        assert!(intent.target_label.is_none());
    }

    #[test]
    fn test_assign_driver() {
        let intent = fallback_parse("assign driver to Path-1 - 07:00");
        assert_eq!(intent.action, actions::ASSIGN_DRIVER);
        assert_eq!(intent.target_label.as_deref(), Some("Path-1 - 07:00"));
    }

    #[test]
    fn test_list_stops() {
        assert_eq!(fallback_parse("list all stops").action, actions::LIST_ALL_STOPS);
        assert_eq!(fallback_parse("List stops").action, actions::LIST_ALL_STOPS);
    }

    #[test]
    fn test_no_match_is_unknown() {
        let intent = fallback_parse("sing me a song");
        assert_eq!(intent.action, actions::UNKNOWN);
        assert_eq!(intent.confidence, 0.0);
    }
}
