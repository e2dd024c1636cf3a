//! Logging utilities
//!
//! Provides tracing initialisation for binaries plus helpers for timing
//! async operations.

use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber
///
/// Reads `RUST_LOG` when set, otherwise falls back to the supplied default
/// filter. Safe to call once per process; subsequent calls are ignored.
///
/// # Arguments
///
/// * `default_filter` - Filter directive used when `RUST_LOG` is unset
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Log execution time of a future at debug level
///
/// # Arguments
///
/// * `name` - Name used in the start/complete log lines
/// * `future` - The future to time
pub async fn timed<F, T>(name: &str, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = Instant::now();
    debug!("Starting: {}", name);

    let result = future.await;

    let elapsed = start.elapsed();
    debug!("Completed: {} in {:?}", name, elapsed);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timed_passes_value_through() {
        let value = timed("unit", async { "done" }).await;
        assert_eq!(value, "done");
    }

    #[test]
    fn test_init_is_idempotent() {
        init("info");
        init("debug");
    }
}
