//! API request/response models
//!
//! The message envelope is deliberately flat: nesting these keys under a
//! `context` object silently disabled page gating in an earlier frontend,
//! so the flat shape (with camelCase aliases for the UI keys) is the
//! contract.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::IncomingMessage;
use crate::state::{ConversationTurn, FinalOutput, Page};

fn default_user_id() -> i64 {
    1
}

/// Message entry request (flat keys)
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    /// User input; may begin with `STRUCTURED_CMD:`
    pub text: String,

    /// Caller identity, default 1
    #[serde(default = "default_user_id")]
    pub user_id: i64,

    /// UI page; null bypasses page gating
    #[serde(default, alias = "currentPage")]
    pub current_page: Option<String>,

    /// UI-selected trip
    #[serde(default, alias = "selectedTripId")]
    pub selected_trip_id: Option<i64>,

    /// UI-selected route
    #[serde(default, alias = "selectedRouteId")]
    pub selected_route_id: Option<i64>,

    /// Text came from OCR extraction
    #[serde(default)]
    pub from_image: bool,

    /// Optional caller-side history; the server also stitches from the
    /// active session
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

impl MessageRequest {
    /// Lift into the service-level message
    pub fn into_message(self) -> IncomingMessage {
        let page = self.current_page.as_deref().and_then(Page::parse);
        IncomingMessage {
            text: self.text,
            user_id: self.user_id,
            page,
            selected_trip_id: self.selected_trip_id,
            selected_route_id: self.selected_route_id,
            from_image: self.from_image,
            conversation_history: self.conversation_history,
        }
    }
}

/// Message entry response
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// The formatter's envelope
    pub agent_output: FinalOutput,
    /// Session awaiting the user's next turn, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

/// Confirmation entry request
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmRequest {
    /// Session to resolve
    pub session_id: Uuid,
    /// true applies the action, false cancels it
    pub confirmed: bool,
    /// Caller identity, default 1
    #[serde(default = "default_user_id")]
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_envelope_with_camel_case_keys() {
        let request: MessageRequest = serde_json::from_str(
            r#"{"text": "cancel it", "currentPage": "dashboard", "selectedTripId": 8}"#,
        )
        .unwrap();
        assert_eq!(request.user_id, 1);
        assert_eq!(request.selected_trip_id, Some(8));
        let message = request.into_message();
        assert_eq!(message.page, Some(Page::Dashboard));
    }

    #[test]
    fn test_null_page_bypasses_gating() {
        let request: MessageRequest =
            serde_json::from_str(r#"{"text": "x", "currentPage": null}"#).unwrap();
        assert!(request.into_message().page.is_none());
    }

    #[test]
    fn test_snake_case_keys_also_accepted() {
        let request: MessageRequest = serde_json::from_str(
            r#"{"text": "x", "current_page": "manageRoute", "selected_route_id": 2}"#,
        )
        .unwrap();
        let message = request.into_message();
        assert_eq!(message.page, Some(Page::ManageRoute));
        assert_eq!(message.selected_route_id, Some(2));
    }
}
