//! Timeout utilities for async operations

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Error returned when an operation exceeds its time budget
#[derive(Debug, Error)]
#[error("Operation '{operation}' timed out after {duration_ms}ms")]
pub struct TimeoutError {
    /// Description of the operation that timed out
    pub operation: String,
    /// Timeout duration in milliseconds
    pub duration_ms: u64,
}

/// Run a future with a time budget
///
/// # Arguments
///
/// * `operation` - Description used in the error message
/// * `duration` - Maximum time the future may take
/// * `future` - The future to drive
pub async fn with_timeout<F, T>(
    operation: &str,
    duration: Duration,
    future: F,
) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(value) => Ok(value),
        Err(_) => Err(TimeoutError {
            operation: operation.to_string(),
            duration_ms: duration.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_budget() {
        let value = with_timeout("fast", Duration::from_secs(1), async { 7 }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_times_out() {
        let result = with_timeout("slow", Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.operation, "slow");
        assert_eq!(err.duration_ms, 5);
    }
}
