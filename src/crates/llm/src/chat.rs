//! Chat model trait and message types
//!
//! The narrow surface the agent needs from a language model: send an
//! ordered list of role-tagged messages, get one completion back,
//! optionally constrained to JSON output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instruction
    System,
    /// End-user turn
    User,
    /// Model turn
    Assistant,
}

impl ChatRole {
    /// Wire name used by OpenAI-compatible APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Ordered messages, oldest first
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f32,
    /// Ask the provider for a JSON object response
    pub json_response: bool,
}

impl ChatRequest {
    /// Create a request from messages with default settings.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: 0.0,
            json_response: false,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Constrain the response to a JSON object.
    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// A chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Completion text
    pub content: String,
}

/// A model that can complete chat requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a chat request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Provider/model label for logging.
    fn label(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("a").role, ChatRole::System);
        assert_eq!(ChatMessage::user("b").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("c").role, ChatRole::Assistant);
    }

    #[test]
    fn test_request_builders() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")])
            .with_temperature(0.2)
            .with_json_response();
        assert!(request.json_response);
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
    }
}
