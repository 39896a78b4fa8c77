use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls
/// back to `info`. Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Lightweight rolling counters for a check-in run.
#[derive(Default, Debug)]
pub struct Telemetry {
    accounts_processed: AtomicU64,
    accounts_failed: AtomicU64,
    auth_failures: AtomicU64,
    sign_successes: AtomicU64,
    sign_failures: AtomicU64,
    timeouts: AtomicU64,
    bonus_mb: AtomicU64,
}

impl Telemetry {
    pub fn record_account(&self, success: bool) {
        self.accounts_processed.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.accounts_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sign_success(&self, bonus_mb: u64) {
        self.sign_successes.fetch_add(1, Ordering::Relaxed);
        self.bonus_mb.fetch_add(bonus_mb, Ordering::Relaxed);
    }

    pub fn record_sign_failure(&self) {
        self.sign_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            accounts_processed: self.accounts_processed.load(Ordering::Relaxed),
            accounts_failed: self.accounts_failed.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            sign_successes: self.sign_successes.load(Ordering::Relaxed),
            sign_failures: self.sign_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            bonus_mb: self.bonus_mb.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub accounts_processed: u64,
    pub accounts_failed: u64,
    pub auth_failures: u64,
    pub sign_successes: u64,
    pub sign_failures: u64,
    pub timeouts: u64,
    pub bonus_mb: u64,
}

/// Spawns a background task that periodically logs run progress.
pub fn spawn_metrics_reporter(
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of tokio's interval fires immediately.
        ticker.tick().await;

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!(target: "cloudsign::metrics", "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let snapshot = telemetry.snapshot();
                    tracing::info!(
                        target: "cloudsign::metrics",
                        accounts = snapshot.accounts_processed,
                        account_failures = snapshot.accounts_failed,
                        sign_successes = snapshot.sign_successes,
                        sign_failures = snapshot.sign_failures,
                        timeouts = snapshot.timeouts,
                        bonus_mb = snapshot.bonus_mb,
                        "run progress"
                    );
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[test]
    fn telemetry_records_counters() {
        let telemetry = Telemetry::default();
        telemetry.record_account(true);
        telemetry.record_account(false);
        telemetry.record_auth_failure();
        telemetry.record_sign_success(300);
        telemetry.record_sign_success(50);
        telemetry.record_sign_failure();
        telemetry.record_timeout();

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.accounts_processed, 2);
        assert_eq!(snapshot.accounts_failed, 1);
        assert_eq!(snapshot.auth_failures, 1);
        assert_eq!(snapshot.sign_successes, 2);
        assert_eq!(snapshot.sign_failures, 1);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.bonus_mb, 350);
    }

    #[tokio::test]
    async fn metrics_reporter_stops_on_cancellation() {
        let telemetry = Arc::new(Telemetry::default());
        let shutdown = CancellationToken::new();
        let handle =
            spawn_metrics_reporter(telemetry, shutdown.clone(), Duration::from_millis(10));

        shutdown.cancel();
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("reporter should stop promptly")
            .expect("task should not panic");
    }
}
