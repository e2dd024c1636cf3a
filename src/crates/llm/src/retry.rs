//! Retrying wrapper around a chat model
//!
//! Applies the provider call discipline: a 30-second budget per attempt,
//! up to 3 attempts, exponential backoff 1s -> 2s -> 4s between failures.
//! A terminal failure surfaces as [`LlmError::RetriesExhausted`]; callers
//! decide what to do next (the intent parser falls through to its regex
//! strategy).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tooling::async_utils::{retry_with_policy, with_timeout, RetryPolicy};
use tracing::warn;

use crate::chat::{ChatModel, ChatRequest, ChatResponse};
use crate::error::{LlmError, Result};

/// Per-attempt time budget.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum attempts per request.
pub const MAX_ATTEMPTS: usize = 3;

/// Chat model wrapper adding timeout and retry behaviour.
pub struct RetryingChatModel {
    inner: Arc<dyn ChatModel>,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl RetryingChatModel {
    /// Wrap a model with the default ladder (3 attempts, 1s/2s/4s backoff).
    pub fn new(inner: Arc<dyn ChatModel>) -> Self {
        Self {
            inner,
            policy: RetryPolicy::new(MAX_ATTEMPTS)
                .with_initial_interval(1.0)
                .with_backoff_factor(2.0)
                .with_jitter(false),
            attempt_timeout: ATTEMPT_TIMEOUT,
        }
    }

    /// Override the per-attempt timeout (tests use milliseconds).
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Override the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl ChatModel for RetryingChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let attempts = self.policy.max_attempts;
        let result = retry_with_policy(&self.policy, || {
            let request = request.clone();
            async move {
                match with_timeout("llm chat", self.attempt_timeout, self.inner.chat(request))
                    .await
                {
                    Ok(inner_result) => inner_result,
                    Err(timeout) => Err(LlmError::Timeout(timeout.to_string())),
                }
            }
        })
        .await;

        result.map_err(|last| {
            warn!(model = %self.inner.label(), error = %last, "chat model call failed terminally");
            LlmError::RetriesExhausted {
                attempts,
                last_error: last.to_string(),
            }
        })
    }

    fn label(&self) -> String {
        format!("retry({})", self.inner.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChatModel;

    #[tokio::test]
    async fn test_success_passes_through() {
        let inner = Arc::new(ScriptedChatModel::always(r#"{"action":"unknown"}"#));
        let model = RetryingChatModel::new(inner).with_policy(
            RetryPolicy::new(3).with_initial_interval(0.001).with_jitter(false),
        );
        let response = model
            .chat(ChatRequest::new(vec![crate::ChatMessage::user("hi")]))
            .await
            .unwrap();
        assert!(response.content.contains("unknown"));
    }

    #[tokio::test]
    async fn test_exhaustion_is_reported_as_terminal() {
        let inner = Arc::new(ScriptedChatModel::failing("service melted"));
        let model = RetryingChatModel::new(inner).with_policy(
            RetryPolicy::new(2).with_initial_interval(0.001).with_jitter(false),
        );
        let err = model
            .chat(ChatRequest::new(vec![crate::ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        match err {
            LlmError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let inner = Arc::new(ScriptedChatModel::always("late").with_delay(Duration::from_secs(5)));
        let model = RetryingChatModel::new(inner)
            .with_attempt_timeout(Duration::from_millis(10))
            .with_policy(RetryPolicy::new(2).with_initial_interval(0.001).with_jitter(false));
        let err = model
            .chat(ChatRequest::new(vec![crate::ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
