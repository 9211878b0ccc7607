use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

use super::error::ProviderError;

/// Timeout and retry policy applied uniformly to every remote call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Base delay for exponential backoff between attempts
    pub base_delay: Duration,
    /// Per-attempt timeout
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            call_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Policy from the environment, with defaults for anything unset.
    ///
    /// `COTIZADOR_TIMEOUT_SECONDS` overrides the per-attempt timeout.
    pub fn from_env() -> Self {
        let call_timeout = std::env::var("COTIZADOR_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.parse().ok())
            .map(Duration::from_secs);
        Self {
            call_timeout: call_timeout.unwrap_or(Self::default().call_timeout),
            ..Self::default()
        }
    }
}

/// Run `op` under the policy.
///
/// Each attempt is bounded by the call timeout. Failed attempts are
/// retried only when the error is classified retryable, with exponential
/// backoff between attempts.
pub async fn call_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    op_name: &str,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = backoff_delay(policy.base_delay, attempt - 1);
            warn!(
                "{}: retrying ({}/{}) after {:?}",
                op_name, attempt, policy.max_retries, delay
            );
            sleep(delay).await;
        }

        let result = match timeout(policy.call_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(policy.call_timeout)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt == policy.max_retries {
                    return Err(err);
                }
                warn!("{}: attempt {} failed ({}): {}", op_name, attempt + 1, err.code(), err);
            }
        }
    }

    // the loop always returns on the last attempt
    Err(ProviderError::config("retry loop exited without a result"))
}

/// Exponential backoff capped at 32x the base delay
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.pow(attempt.min(5))
}
