//! Prompt assembly for the model-driven parse
//!
//! The system prompt carries the full action catalog with one-line
//! descriptions, the caller's page and selection context, and the
//! required JSON output shape. Conversation history rides as separate
//! chat turns, bounded to the configured retention.

use llm::{ChatMessage, ChatRequest};

use crate::catalog::ActionCatalog;
use crate::state::FlowState;

/// Build the chat request for one parse
pub fn build_request(
    catalog: &ActionCatalog,
    state: &FlowState,
    history_limit: usize,
) -> ChatRequest {
    let mut messages = vec![ChatMessage::system(system_prompt(catalog, state))];

    let history = &state.conversation_history;
    let skip = history.len().saturating_sub(history_limit);
    for turn in history.iter().skip(skip) {
        match turn.role.as_str() {
            "assistant" => messages.push(ChatMessage::assistant(turn.content.clone())),
            _ => messages.push(ChatMessage::user(turn.content.clone())),
        }
    }

    messages.push(ChatMessage::user(state.input_text.clone()));
    ChatRequest::new(messages).with_json_response()
}

fn system_prompt(catalog: &ActionCatalog, state: &FlowState) -> String {
    let mut prompt = String::from(
        "You are the intent parser for MOVI, a fleet operations assistant. \
         Classify the user's message into exactly one action from the catalog below \
         and extract its parameters.\n\nActions:\n",
    );

    for spec in catalog.iter() {
        prompt.push_str(&format!("- {}: {}\n", spec.name, spec.description));
    }

    prompt.push_str("\nContext:\n");
    match state.page {
        Some(page) => prompt.push_str(&format!("- current page: {}\n", page.as_str())),
        None => prompt.push_str("- current page: unknown (no page gating)\n"),
    }
    if let Some(trip_id) = state.selected_trip_id {
        prompt.push_str(&format!("- selected trip id: {}\n", trip_id));
    }
    if let Some(route_id) = state.selected_route_id {
        prompt.push_str(&format!("- selected route id: {}\n", route_id));
    }
    if state.from_image {
        prompt.push_str("- the message text was extracted from an image\n");
    }

    prompt.push_str(
        "\nRespond with a single JSON object:\n\
         {\"action\": string, \"confidence\": number 0..1, \"parameters\": object, \
         \"target_label\": string?, \"target_trip_id\": integer?, \
         \"target_time\": string?, \"explanation\": string?}\n\
         Use target_label for textual trip references like \"Path-3 - 07:30\". \
         Do not invent ids. Use action \"unknown\" when unsure.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ConversationTurn;

    #[test]
    fn test_prompt_lists_catalog_and_context() {
        let catalog = ActionCatalog::standard();
        let mut state = FlowState::new(1, "cancel the 07:30");
        state.selected_trip_id = Some(8);
        let request = build_request(&catalog, &state, 20);

        let system = &request.messages[0].content;
        assert!(system.contains("cancel_trip"));
        assert!(system.contains("selected trip id: 8"));
        assert!(request.json_response);
        // Last message is the user text.
        assert_eq!(request.messages.last().unwrap().content, "cancel the 07:30");
    }

    #[test]
    fn test_history_is_bounded() {
        let catalog = ActionCatalog::standard();
        let mut state = FlowState::new(1, "latest");
        for i in 0..50 {
            state
                .conversation_history
                .push(ConversationTurn::user(format!("turn {}", i)));
        }
        let request = build_request(&catalog, &state, 20);
        // system + 20 history + current user text
        assert_eq!(request.messages.len(), 22);
        assert_eq!(request.messages[1].content, "turn 30");
    }
}
