use crate::exec::outcome::Outcome;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Bounded retry with linear backoff.
///
/// `max_attempts` counts the initial invocation, so a value of 1 means no
/// retry at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay inserted after a failed attempt `k` (1-based): `base_delay * k`.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let factor = attempt.min(u32::MAX as usize) as u32;
        self.base_delay.saturating_mul(factor)
    }
}

/// Invokes `op` until it succeeds or the attempt budget is spent.
///
/// Intermediate failures are deliberately quiet; the guard underneath already
/// logged them, and retry exists to absorb transient noise rather than
/// amplify it. The final attempt's failure propagates untouched.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Outcome<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts() {
                    tracing::debug!(label, attempt, error = %err, "retry budget exhausted");
                    return Err(err);
                }
                sleep(policy.delay_after(attempt)).await;
            }
        }
    }
}
