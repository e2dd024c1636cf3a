//! Model-driven parse and normalisation
//!
//! Sends the assembled prompt to the chat model and normalises the raw
//! JSON it returns: synonym mapping, catalog membership, near-miss
//! similarity matching with a hard acceptance threshold.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use llm::ChatModel;

use crate::catalog::ActionCatalog;
use crate::intent::prompt;
use crate::state::{FlowState, Intent};

/// Similarity acceptance threshold for out-of-catalog action names
const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Raw JSON shape the model is asked for
#[derive(Debug, Deserialize)]
struct RawIntent {
    action: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
    #[serde(default)]
    target_label: Option<String>,
    #[serde(default)]
    target_trip_id: Option<Value>,
    #[serde(default)]
    target_time: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Outcome of the model strategy
pub enum ModelParse {
    /// A usable intent
    Parsed(Intent),
    /// The model path is exhausted; fall through to the regex strategy
    Unavailable,
}

/// Run the model strategy
pub async fn parse_with_model(
    model: &dyn ChatModel,
    catalog: &ActionCatalog,
    state: &FlowState,
    history_limit: usize,
) -> ModelParse {
    let request = prompt::build_request(catalog, state, history_limit);
    let response = match model.chat(request).await {
        Ok(response) => response,
        Err(err) => {
            debug!(error = %err, "model parse unavailable");
            return ModelParse::Unavailable;
        }
    };

    match parse_response(&response.content, catalog) {
        Some(intent) => ModelParse::Parsed(intent),
        // Malformed JSON is treated the same as a terminal model failure.
        None => ModelParse::Unavailable,
    }
}

/// Parse and normalise a raw model response
pub fn parse_response(content: &str, catalog: &ActionCatalog) -> Option<Intent> {
    let raw: RawIntent = serde_json::from_str(strip_fences(content)).ok()?;

    let mut parameters = raw.parameters.unwrap_or_default();
    if let Some(time) = raw.target_time {
        parameters
            .entry("new_time".to_string())
            .or_insert(Value::String(time));
    }

    let target_trip_id = raw.target_trip_id.and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    let mut confidence = raw.confidence.unwrap_or(0.5).clamp(0.0, 1.0) as f32;
    let action = normalise_action(&raw.action, catalog, &mut confidence);

    Some(Intent {
        action,
        confidence,
        parameters,
        target_label: raw.target_label.filter(|l| !l.trim().is_empty()),
        target_trip_id,
        explanation: raw.explanation,
    })
}

/// Map the model's raw action string onto the catalog
fn normalise_action(raw: &str, catalog: &ActionCatalog, confidence: &mut f32) -> String {
    let normalised = raw.trim().to_lowercase().replace([' ', '-'], "_");
    if catalog.contains(&normalised) {
        return normalised;
    }
    if let Some(mapped) = catalog.synonym(&normalised) {
        return mapped.to_string();
    }
    if let Some((best, score)) = catalog.closest_match(&normalised) {
        if score >= SIMILARITY_THRESHOLD {
            debug!(raw = %raw, matched = %best, score, "similarity-matched action");
            return best.to_string();
        }
    }
    *confidence = 0.0;
    "unknown".to_string()
}

fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ActionCatalog {
        ActionCatalog::standard()
    }

    #[test]
    fn test_parses_clean_response() {
        let content = r#"{"action": "cancel_trip", "confidence": 0.92,
            "target_label": "Path-3 - 07:30", "parameters": {}}"#;
        let intent = parse_response(content, &catalog()).unwrap();
        assert_eq!(intent.action, "cancel_trip");
        assert_eq!(intent.target_label.as_deref(), Some("Path-3 - 07:30"));
        assert!((intent.confidence - 0.92).abs() < 0.001);
    }

    #[test]
    fn test_strips_markdown_fences() {
        let content = "```json\n{\"action\": \"list_all_stops\"}\n```";
        let intent = parse_response(content, &catalog()).unwrap();
        assert_eq!(intent.action, "list_all_stops");
    }

    #[test]
    fn test_synonym_is_mapped() {
        let content = r#"{"action": "delete trip", "confidence": 0.8}"#;
        let intent = parse_response(content, &catalog()).unwrap();
        assert_eq!(intent.action, "cancel_trip");
    }

    #[test]
    fn test_near_miss_is_similarity_matched() {
        let content = r#"{"action": "cancel_tripp", "confidence": 0.8}"#;
        let intent = parse_response(content, &catalog()).unwrap();
        assert_eq!(intent.action, "cancel_trip");
    }

    #[test]
    fn test_far_miss_becomes_unknown() {
        let content = r#"{"action": "do_a_dance", "confidence": 0.9}"#;
        let intent = parse_response(content, &catalog()).unwrap();
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.confidence, 0.0);
    }

    #[test]
    fn test_malformed_json_is_none() {
        assert!(parse_response("the user wants to cancel", &catalog()).is_none());
    }

    #[test]
    fn test_target_time_lands_in_parameters() {
        let content =
            r#"{"action": "update_trip_time", "target_time": "09:45", "confidence": 0.9}"#;
        let intent = parse_response(content, &catalog()).unwrap();
        assert_eq!(intent.parameters["new_time"], Value::String("09:45".into()));
    }

    #[test]
    fn test_string_trip_id_is_coerced() {
        let content = r#"{"action": "cancel_trip", "target_trip_id": "12", "confidence": 0.9}"#;
        let intent = parse_response(content, &catalog()).unwrap();
        assert_eq!(intent.target_trip_id, Some(12));
    }
}
