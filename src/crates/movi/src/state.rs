//! Flow state: the record threaded through every node of a request
//!
//! One [`FlowState`] is created per inbound message and owned by the graph
//! runtime for the duration of the run. Every node reads the fields it
//! needs and writes only the fields it owns; the result formatter
//! populates [`FlowState::final_output`] exactly once at the terminal
//! node.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use flow_core::{FlowControl, FlowFailure, NodeId};

use crate::error::{ErrorInfo, ErrorKind};
use crate::wizard::WizardState;

/// UI page the user is on, when known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Page {
    /// Operations dashboard (trips, vehicles, drivers)
    Dashboard,
    /// Route/network management screen (stops, paths, routes)
    ManageRoute,
}

impl Page {
    /// Wire name as the frontend sends it
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::ManageRoute => "manageRoute",
        }
    }

    /// Parse the frontend wire name (camelCase or snake_case)
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dashboard" => Some(Page::Dashboard),
            "manageRoute" | "manage_route" => Some(Page::ManageRoute),
            _ => None,
        }
    }
}

/// One conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// "user" or "assistant"
    pub role: String,
    /// Turn text
    pub content: String,
}

impl ConversationTurn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Parsed intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Action name from the catalog, or "unknown" / "context_mismatch"
    pub action: String,
    /// Parser confidence in [0, 1]
    pub confidence: f32,
    /// Action-specific parameters
    pub parameters: Map<String, Value>,
    /// Textual target ("Bulk - 00:01", a stop name, ...)
    pub target_label: Option<String>,
    /// Model-supplied trip id
    pub target_trip_id: Option<i64>,
    /// Model's one-line reasoning, for logs only
    pub explanation: Option<String>,
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            action: "unknown".to_string(),
            confidence: 0.0,
            parameters: Map::new(),
            target_label: None,
            target_trip_id: None,
            explanation: None,
        }
    }
}

/// Entity category a resolved target belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Trip,
    Route,
    Path,
    Stop,
    Vehicle,
    Driver,
}

impl EntityType {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Trip => "trip",
            EntityType::Route => "route",
            EntityType::Path => "path",
            EntityType::Stop => "stop",
            EntityType::Vehicle => "vehicle",
            EntityType::Driver => "driver",
        }
    }
}

/// Concrete database identity the resolver settled on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedTarget {
    /// Entity category
    pub entity_type: EntityType,
    /// Row id; consistent with `entity_type` by construction
    pub entity_id: i64,
    /// Display label for messages
    pub label: String,
}

/// Outcome of the resolve node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveOutcome {
    Found,
    NotFound,
    Ambiguous,
    Skipped,
}

/// Impact snapshot computed before a risky mutation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Consequences {
    /// Active bookings affected
    pub booking_count: i64,
    /// Bookings as a percentage of trip capacity
    pub booking_percentage: f64,
    /// Vehicle or driver currently assigned
    pub has_deployment: bool,
    /// Trip lifecycle state, when the target is a trip
    pub live_status: Option<String>,
    /// Paths using a stop, routes using a path, trips using a route
    pub downstream: i64,
}

/// One pickable option shown to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarificationOption {
    /// Identifier echoed back by the UI (row id or action token)
    pub id: String,
    /// Button label
    pub label: String,
    /// Secondary line
    pub description: String,
}

/// What kind of UI pick is awaited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    Driver,
    Vehicle,
    Trip,
}

/// Result payload produced by a tool
///
/// `data` already carries the `{type, data}` shape the UI renders; the
/// formatter passes it through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// User-facing summary
    pub message: String,
    /// Tagged payload: `{"type": "table" | "object" | "list" | "help", "data": ...}`
    pub data: Value,
}

/// Snapshot persisted in a pending-confirmation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// Action awaiting the user's yes/no
    pub action: String,
    /// Parameters captured at parse time
    pub parameters: Map<String, Value>,
    /// Resolved target captured at resolve time
    pub resolved: Option<ResolvedTarget>,
    /// Consequences snapshot shown to the user
    pub consequences: Consequences,
}

/// Terminal status of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    AwaitingConfirmation,
    AwaitingClarification,
    Executed,
    Cancelled,
    Error,
}

/// Structured response envelope the UI renders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalOutput {
    /// Action the request resolved to
    pub action: String,
    /// Terminal status
    pub status: OutputStatus,
    /// Whether the request succeeded (false only for errors)
    pub success: bool,
    /// User-facing text
    pub message: String,
    /// Session handle, present exactly when the flow is awaiting the
    /// user's next turn (confirmation or wizard mid-flight)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    /// Consequences snapshot, when a confirmation is pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consequences: Option<Consequences>,
    /// Kind of UI pick awaited, when a selection provider ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_type: Option<SelectionType>,
    /// Pickable options, when a clarification or selection is pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ClarificationOption>>,
    /// Free-form suggestions (fallback hints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    /// Executor payload, passed through from the tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error record, when status is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// The record threaded through every node of a single request
#[derive(Debug, Clone)]
pub struct FlowState {
    /// Caller-supplied user identity
    pub user_id: i64,
    /// Raw input text (possibly a structured command)
    pub input_text: String,
    /// UI page context; `None` bypasses page gating
    pub page: Option<Page>,
    /// UI-selected trip
    pub selected_trip_id: Option<i64>,
    /// UI-selected route
    pub selected_route_id: Option<i64>,
    /// Input text came from OCR extraction
    pub from_image: bool,
    /// Recent conversation turns, oldest first
    pub conversation_history: Vec<ConversationTurn>,

    /// Parsed intent
    pub intent: Intent,
    /// Resolver output
    pub resolved: Option<ResolvedTarget>,
    /// Resolver outcome
    pub resolve_result: Option<ResolveOutcome>,
    /// Consequence snapshot for risky actions
    pub consequences: Option<Consequences>,

    /// A confirmation session was created and execution is blocked on it
    pub needs_confirmation: bool,
    /// The user must clarify before anything can run
    pub needs_clarification: bool,
    /// Options backing a clarification or selection
    pub clarification_options: Vec<ClarificationOption>,
    /// Kind of UI pick awaited
    pub selection_type: Option<SelectionType>,
    /// A selection provider produced options this turn
    pub awaiting_selection: bool,

    /// Active wizard, restored from its session before the run
    pub wizard: Option<WizardState>,
    /// Session backing the active wizard
    pub wizard_session_id: Option<Uuid>,

    /// Session backing a pending confirmation
    pub pending_session_id: Option<Uuid>,
    /// Tool output, set only by the executor
    pub execution_result: Option<ExecutionResult>,
    /// First captured error
    pub error: Option<ErrorInfo>,
    /// User-facing text produced by a node (wizard prompt, mismatch
    /// notice, fallback help); the formatter prefers it
    pub reply: Option<String>,
    /// Fallback suggestions
    pub suggestions: Vec<String>,

    /// Response envelope; populated exactly once by the formatter
    pub final_output: Option<FinalOutput>,
    /// Successor override consumed by the runtime
    pub next_node: Option<NodeId>,
}

impl FlowState {
    /// Create the state for one inbound message
    pub fn new(user_id: i64, input_text: impl Into<String>) -> Self {
        Self {
            user_id,
            input_text: input_text.into(),
            page: None,
            selected_trip_id: None,
            selected_route_id: None,
            from_image: false,
            conversation_history: Vec::new(),
            intent: Intent::default(),
            resolved: None,
            resolve_result: None,
            consequences: None,
            needs_confirmation: false,
            needs_clarification: false,
            clarification_options: Vec::new(),
            selection_type: None,
            awaiting_selection: false,
            wizard: None,
            wizard_session_id: None,
            pending_session_id: None,
            execution_result: None,
            error: None,
            reply: None,
            suggestions: Vec::new(),
            final_output: None,
            next_node: None,
        }
    }

    /// Record an error unless one is already present
    ///
    /// First error wins; later failures must not mask the root cause.
    pub fn set_error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(ErrorInfo::new(kind, message));
        }
    }

    /// The resolved trip id, when the target is a trip
    pub fn resolved_trip_id(&self) -> Option<i64> {
        match &self.resolved {
            Some(target) if target.entity_type == EntityType::Trip => Some(target.entity_id),
            _ => None,
        }
    }

    /// Integer parameter, coercing integer-looking strings
    pub fn param_i64(&self, key: &str) -> Option<i64> {
        match self.intent.parameters.get(key) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String parameter
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.intent.parameters.get(key).and_then(Value::as_str)
    }
}

impl FlowControl for FlowState {
    fn take_next_node(&mut self) -> Option<NodeId> {
        self.next_node.take()
    }

    fn record_failure(&mut self, failure: FlowFailure) {
        match failure {
            FlowFailure::Node { node, message } => {
                self.set_error(
                    ErrorKind::Internal,
                    format!("stage '{}' failed: {}", node, message),
                );
            }
            FlowFailure::CycleBudget { iterations } => {
                self.set_error(
                    ErrorKind::GraphCycle,
                    format!("flow did not terminate within {} stages", iterations),
                );
            }
            FlowFailure::Stuck { node } => {
                self.set_error(
                    ErrorKind::Internal,
                    format!("stage '{}' has no outgoing transition", node),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_error_wins() {
        let mut state = FlowState::new(1, "cancel trip");
        state.set_error(ErrorKind::TripNotFound, "no such trip");
        state.set_error(ErrorKind::Internal, "later failure");
        assert_eq!(state.error.as_ref().unwrap().kind, ErrorKind::TripNotFound);
    }

    #[test]
    fn test_param_i64_coerces_strings() {
        let mut state = FlowState::new(1, "x");
        state
            .intent
            .parameters
            .insert("trip_id".to_string(), json!("8"));
        state
            .intent
            .parameters
            .insert("driver_id".to_string(), json!(5));
        assert_eq!(state.param_i64("trip_id"), Some(8));
        assert_eq!(state.param_i64("driver_id"), Some(5));
        assert_eq!(state.param_i64("missing"), None);
    }

    #[test]
    fn test_page_parse() {
        assert_eq!(Page::parse("dashboard"), Some(Page::Dashboard));
        assert_eq!(Page::parse("manageRoute"), Some(Page::ManageRoute));
        assert_eq!(Page::parse("manage_route"), Some(Page::ManageRoute));
        assert_eq!(Page::parse("settings"), None);
    }

    #[test]
    fn test_resolved_trip_id_requires_trip_type() {
        let mut state = FlowState::new(1, "x");
        state.resolved = Some(ResolvedTarget {
            entity_type: EntityType::Path,
            entity_id: 2,
            label: "Path-2".to_string(),
        });
        assert_eq!(state.resolved_trip_id(), None);
    }
}
