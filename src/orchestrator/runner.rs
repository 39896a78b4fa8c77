use crate::client::notify::NotifySink;
use crate::client::session::CloudClient;
use crate::exec::outcome::SignError;
use crate::orchestrator::report::{AccountResult, AggregateReport};
use crate::orchestrator::workflow::run_account;
use crate::runtime::accounts::Account;
use crate::runtime::config::OrchestratorConfig;
use crate::runtime::telemetry::Telemetry;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

enum Slot {
    Skipped(String),
    Pending {
        masked: String,
        handle: JoinHandle<AccountResult>,
    },
}

/// Drives every configured account through its workflow and delivers the
/// aggregate report.
///
/// Accounts run concurrently with staggered starts. Each workflow lands in
/// its own spawned task, so a panic is contained by the `JoinHandle` and
/// becomes a failed fragment instead of taking the run down.
pub struct Orchestrator {
    config: Arc<OrchestratorConfig>,
    client: Arc<dyn CloudClient>,
    notifier: Arc<dyn NotifySink>,
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        config: Arc<OrchestratorConfig>,
        client: Arc<dyn CloudClient>,
        notifier: Arc<dyn NotifySink>,
    ) -> Self {
        Self {
            config,
            client,
            notifier,
            telemetry: Arc::new(Telemetry::default()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Root shutdown token; cancel it to stop launching further accounts.
    /// Already-launched accounts settle and the report still goes out.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        Arc::clone(&self.telemetry)
    }

    /// Processes `accounts` in order and hands the finished report to the
    /// notification sink exactly once. No individual account's fault can
    /// prevent the remaining accounts or the final report.
    pub async fn run(&self, accounts: Vec<Account>) -> AggregateReport {
        let mut slots = Vec::with_capacity(accounts.len());
        let mut launched: u32 = 0;

        for (index, account) in accounts.into_iter().enumerate() {
            if !account.is_complete() {
                tracing::error!(index, "account entry is missing a username or password");
                let failure = SignError::Config {
                    message: "missing username or password".to_owned(),
                };
                slots.push(Slot::Skipped(format!("account #{}: {failure}", index + 1)));
                continue;
            }

            let masked = account.masked_username();
            if self.shutdown.is_cancelled() {
                slots.push(Slot::Skipped(format!(
                    "{masked} skipped: shutdown requested"
                )));
                continue;
            }

            // Staggered launch: account i starts interval*i after the first,
            // keeping consecutive launches at least one interval apart.
            let delay = self.config.account_interval().saturating_mul(launched);
            launched += 1;

            let client = Arc::clone(&self.client);
            let config = Arc::clone(&self.config);
            let telemetry = Arc::clone(&self.telemetry);
            let shutdown = self.shutdown.clone();
            let task_masked = masked.clone();
            let handle = tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            return AccountResult::failed(
                                &task_masked,
                                format!("{task_masked} skipped: shutdown requested"),
                            );
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                run_account(client, account, config, telemetry).await
            });

            slots.push(Slot::Pending { masked, handle });
        }

        let mut report = AggregateReport::default();
        for slot in slots {
            match slot {
                Slot::Skipped(fragment) => report.record_skipped(fragment),
                Slot::Pending { masked, handle } => match handle.await {
                    Ok(result) => {
                        self.telemetry.record_account(result.success());
                        report.record(&result);
                    }
                    Err(join_err) => {
                        tracing::error!(
                            account = %masked,
                            error = %join_err,
                            "account workflow task failed"
                        );
                        self.telemetry.record_account(false);
                        report.record_skipped(format!(
                            "{masked} processing failed unexpectedly: {join_err}"
                        ));
                    }
                },
            }
        }

        tracing::info!(
            accounts = report.account_count(),
            failures = report.failure_count(),
            total_family_mb = report.total_family_bonus_mb(),
            "orchestration complete"
        );

        self.dispatch(&report).await;
        report
    }

    async fn dispatch(&self, report: &AggregateReport) {
        let title = report.title();
        let body = report.body();
        if let Err(err) = self.notifier.send(&title, &body).await {
            let failure = SignError::Notification {
                message: format!("{err:#}"),
            };
            tracing::warn!(error = %failure, "failed to deliver summary notification");
        }
    }
}
