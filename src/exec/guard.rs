use crate::exec::outcome::{Outcome, SignError};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Races `operation` against `deadline` and converts every way it can go
/// wrong into a typed [`Outcome`].
///
/// Cancellation is logical only: when the timer fires first the operation is
/// dropped and its eventual remote side effect, if any, is discarded
/// (sign-ins are assumed idempotent). Failures emit a single diagnostic log
/// entry; success is silent.
pub async fn guard<T>(
    operation: impl Future<Output = anyhow::Result<T>>,
    deadline: Duration,
    label: &str,
) -> Outcome<T> {
    match timeout(deadline, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            let failure = SignError::Remote {
                label: label.to_owned(),
                message: format!("{err:#}"),
            };
            tracing::warn!(label, error = %failure, "guarded operation failed");
            Err(failure)
        }
        Err(_) => {
            let timeout_ms = deadline.as_millis().min(u128::from(u64::MAX)) as u64;
            let failure = SignError::Timeout {
                label: label.to_owned(),
                timeout_ms,
            };
            tracing::warn!(label, timeout_ms, "guarded operation timed out");
            Err(failure)
        }
    }
}
