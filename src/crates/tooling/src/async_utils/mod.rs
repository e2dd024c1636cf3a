//! Async utilities for common async patterns
//!
//! Provides retry policies with exponential backoff and timeout wrappers
//! for async operations that talk to flaky collaborators (databases,
//! model providers).

pub mod retry;
pub mod timeout;

pub use retry::{retry_with_policy, RetryPolicy};
pub use timeout::{with_timeout, TimeoutError};
