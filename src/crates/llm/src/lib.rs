//! LLM provider abstraction for the movi workspace
//!
//! Defines the [`ChatModel`] trait the agent's intent parser is written
//! against, plus a remote OpenAI-compatible client and a retrying wrapper
//! implementing the provider call discipline: a hard per-attempt timeout,
//! up to three attempts, exponential backoff between them.
//!
//! Tests use [`testing::ScriptedChatModel`], which replays canned
//! responses without touching the network.

pub mod chat;
pub mod config;
pub mod error;
pub mod remote;
pub mod retry;
pub mod testing;

pub use chat::{ChatMessage, ChatModel, ChatRequest, ChatResponse, ChatRole};
pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use remote::OpenAiClient;
pub use retry::RetryingChatModel;
