//! Retry with exponential backoff for flaky upstream calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Share of the computed delay added as random jitter.
const JITTER_RATIO: f64 = 0.3;

const RETRYABLE_MARKERS: &[&str] = &[
    "429",
    "rate limit",
    "too many requests",
    "timeout",
    "timed out",
    "econnreset",
    "connection reset",
    "socket hang up",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff before retry number `attempt` (1-based): `base * 2^(attempt-1)`
    /// plus up to 30% jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32 << exponent);
        let jitter = rand::thread_rng().gen_range(0.0..=JITTER_RATIO);
        backoff + backoff.mul_f64(jitter)
    }
}

/// Rate limits, timeouts and connection resets are worth another try;
/// everything else is not.
pub fn is_retryable(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RETRYABLE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Runs `operation` until it succeeds, fails with a non-retryable error or
/// runs out of attempts. The closure receives the 1-based attempt number.
pub async fn retry_async<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts && is_retryable(&err.to_string()) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
