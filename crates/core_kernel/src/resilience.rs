//! Timeout and retry wrapper for external service calls
//!
//! Every call that leaves the process (reasoning service, retrieval service) goes
//! through [`call_with_retry`]. Each attempt is bounded by `CallPolicy::timeout_ms`;
//! transient failures are retried up to `max_retries` times with a fixed delay.
//! Non-transient failures (unauthorized, malformed reply) are returned immediately.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ports::PortError;

/// Timeout and retry settings for one class of external call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPolicy {
    /// Upper bound for a single attempt in milliseconds
    pub timeout_ms: u64,
    /// Additional attempts after the first one fails transiently
    pub max_retries: u32,
    /// Pause between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            max_retries: 1,
            retry_delay_ms: 500,
        }
    }
}

impl CallPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Runs `call` under the given policy.
///
/// # Arguments
///
/// * `operation` - Name used in timeout errors and retry logs
/// * `policy` - Timeout and retry settings
/// * `call` - Produces a fresh future for every attempt
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, `PortError::Timeout` when
/// the final attempt exceeded the timeout.
pub async fn call_with_retry<T, F, Fut>(
    operation: &str,
    policy: &CallPolicy,
    mut call: F,
) -> Result<T, PortError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PortError>>,
{
    let attempts = policy.max_retries + 1;
    let mut attempt = 0;

    loop {
        attempt += 1;
        let outcome = match tokio::time::timeout(policy.timeout(), call()).await {
            Ok(result) => result,
            Err(_) => Err(PortError::Timeout {
                operation: operation.to_string(),
                duration_ms: policy.timeout_ms,
            }),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < attempts => {
                warn!(
                    operation,
                    attempt,
                    max_attempts = attempts,
                    error = %error,
                    "External call failed, retrying"
                );
                tokio::time::sleep(policy.retry_delay()).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> CallPolicy {
        CallPolicy {
            timeout_ms: 50,
            max_retries: 1,
            retry_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_failure_once() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry("test.op", &fast_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(PortError::unavailable("reasoning"))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_single_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry("test.op", &fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PortError::connection("refused")) }
        })
        .await;

        assert!(matches!(result, Err(PortError::Connection { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry("test.op", &fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(PortError::Unauthorized {
                    message: "bad key".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(PortError::Unauthorized { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hung_call_times_out() {
        let result: Result<(), _> = call_with_retry("slow.op", &fast_policy(), || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(PortError::Timeout { operation, duration_ms }) => {
                assert_eq!(operation, "slow.op");
                assert_eq!(duration_ms, 50);
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
    }
}
