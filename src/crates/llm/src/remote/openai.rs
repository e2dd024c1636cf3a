//! OpenAI-compatible chat completions client.
//!
//! Speaks the `/chat/completions` dialect shared by OpenAI, OpenRouter,
//! and most self-hosted gateways, which is all the agent needs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chat::{ChatModel, ChatRequest, ChatResponse};
use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};

/// OpenAI-compatible API client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::HttpError)?;
        Ok(Self { config, client })
    }

    fn convert_messages(&self, request: &ChatRequest) -> Vec<ApiMessage> {
        request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let mut body = json!({
            "model": self.config.model,
            "messages": self.convert_messages(&request),
            "temperature": request.temperature,
        });
        if request.json_response {
            body["response_format"] = json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(format!("request to {} timed out", url))
                } else {
                    LlmError::HttpError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let truncated: String = body.chars().take(512).collect();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body: truncated,
            });
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("malformed response body: {}", e)))?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| LlmError::InvalidResponse("response carried no choices".to_string()))?;

        Ok(ChatResponse { content })
    }

    fn label(&self) -> String {
        format!("openai:{}", self.config.model)
    }
}
