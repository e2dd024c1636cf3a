//! Remote LLM provider clients.

mod openai;

pub use openai::OpenAiClient;
