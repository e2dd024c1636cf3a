//! Scripted chat model for tests
//!
//! Replays canned completions in order (repeating the last one) and
//! counts calls, so tests can assert both on parser output and on whether
//! the model was consulted at all.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::chat::{ChatModel, ChatRequest, ChatResponse};
use crate::error::{LlmError, Result};

/// Deterministic in-memory chat model.
pub struct ScriptedChatModel {
    responses: Mutex<Vec<String>>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedChatModel {
    /// Model that always answers with `content`.
    pub fn always(content: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(vec![content.into()]),
            fail_with: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Model that replays `responses` in order, repeating the last.
    pub fn sequence(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            fail_with: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Model whose every call fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Add an artificial delay before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of chat calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail_with {
            return Err(LlmError::InvalidResponse(message.clone()));
        }

        let mut responses = self.responses.lock();
        let content = if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses
                .first()
                .cloned()
                .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))?
        };
        Ok(ChatResponse { content })
    }

    fn label(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;

    #[tokio::test]
    async fn test_sequence_repeats_last() {
        let model =
            ScriptedChatModel::sequence(vec!["one".to_string(), "two".to_string()]);
        let request = ChatRequest::new(vec![ChatMessage::user("x")]);
        assert_eq!(model.chat(request.clone()).await.unwrap().content, "one");
        assert_eq!(model.chat(request.clone()).await.unwrap().content, "two");
        assert_eq!(model.chat(request).await.unwrap().content, "two");
        assert_eq!(model.call_count(), 3);
    }
}
