use anyhow::{Context, Result};
use cloudsign::client::{HttpCloudClient, LogNotifier, NotifySink, WebhookNotifier};
use cloudsign::orchestrator::Orchestrator;
use cloudsign::runtime::telemetry::spawn_metrics_reporter;
use cloudsign::runtime::{init_tracing, load_accounts, OrchestratorConfig};
use std::sync::Arc;

const API_BASE_ENV: &str = "CLOUDSIGN_API_BASE";
const NOTIFY_WEBHOOK_ENV: &str = "CLOUDSIGN_NOTIFY_WEBHOOK";

/// Exit code 0 on any completed run, individual account failures included;
/// non-zero only when the orchestration loop itself cannot start.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Arc::new(OrchestratorConfig::from_env().context("invalid configuration")?);
    let accounts = load_accounts()?;

    let api_base =
        std::env::var(API_BASE_ENV).with_context(|| format!("{API_BASE_ENV} is required"))?;
    let client = Arc::new(HttpCloudClient::new(api_base, config.operation_timeout())?);

    let notifier: Arc<dyn NotifySink> = match std::env::var(NOTIFY_WEBHOOK_ENV) {
        Ok(url) if !url.trim().is_empty() => Arc::new(WebhookNotifier::new(url)?),
        _ => Arc::new(LogNotifier),
    };

    let orchestrator = Orchestrator::new(Arc::clone(&config), client, notifier);
    let shutdown = orchestrator.cancellation_token();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received; letting in-flight accounts settle");
                shutdown.cancel();
            }
        }
    });

    let reporter = spawn_metrics_reporter(
        orchestrator.telemetry(),
        shutdown.clone(),
        config.metrics_interval(),
    );

    tracing::info!(accounts = accounts.len(), "starting daily check-in run");
    let report = orchestrator.run(accounts).await;

    shutdown.cancel();
    let _ = reporter.await;

    let snapshot = orchestrator.telemetry().snapshot();
    tracing::info!(
        accounts = report.account_count(),
        failures = report.failure_count(),
        sign_successes = snapshot.sign_successes,
        sign_failures = snapshot.sign_failures,
        timeouts = snapshot.timeouts,
        total_family_mb = report.total_family_bonus_mb(),
        "run complete"
    );
    Ok(())
}
