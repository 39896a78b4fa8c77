use crate::client::session::{CloudClient, CloudSession};
use crate::exec::batch::run_batch;
use crate::exec::guard::guard;
use crate::exec::outcome::{Outcome, SignError};
use crate::exec::retry::{with_retry, RetryPolicy};
use crate::orchestrator::report::AccountResult;
use crate::runtime::accounts::Account;
use crate::runtime::config::OrchestratorConfig;
use crate::runtime::telemetry::Telemetry;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

/// Runs the full sign-in workflow for one account.
///
/// Only an authentication failure aborts the workflow, and even that comes
/// back as a failed [`AccountResult`], never as an error: individual sign-in
/// failures are absorbed into the totals as zero-bonus attempts.
pub async fn run_account(
    client: Arc<dyn CloudClient>,
    account: Account,
    config: Arc<OrchestratorConfig>,
    telemetry: Arc<Telemetry>,
) -> AccountResult {
    let masked = account.masked_username();
    tracing::debug!(account = %masked, "starting account workflow");

    let session = match guard(
        client.login(&account.username, &account.password),
        config.operation_timeout(),
        "login",
    )
    .await
    {
        Ok(session) => session,
        Err(err) => {
            telemetry.record_auth_failure();
            let failure = match err {
                SignError::Remote { message, .. } => SignError::Auth { message },
                other => other,
            };
            return AccountResult::failed(&masked, format!("{masked} sign-in failed: {failure}"));
        }
    };

    let policy = RetryPolicy::new(config.retry_attempts(), config.retry_base_delay());
    let timeout = config.operation_timeout();

    let personal_tasks: Vec<BoxFuture<'static, Outcome<u64>>> = (0..config.personal_concurrency())
        .map(|i| {
            let session = Arc::clone(&session);
            let label = format!("personal sign-in #{}", i + 1);
            async move {
                with_retry(policy, &label, |_| {
                    let session = Arc::clone(&session);
                    let label = label.clone();
                    async move {
                        guard(session.personal_sign(), timeout, &label)
                            .await
                            .map(|bonus| bonus.bonus_mb)
                    }
                })
                .await
            }
            .boxed()
        })
        .collect();

    let personal_outcomes = run_batch(
        personal_tasks,
        config.personal_concurrency(),
        "personal sign-in",
    )
    .await;
    let (personal_total, personal_ok) = tally(&personal_outcomes, &telemetry);

    let mut lines = vec![format!("account {masked}")];
    lines.push(format!(
        "personal sign-in: +{personal_total}MB ({personal_ok}/{} succeeded)",
        config.personal_concurrency()
    ));

    let mut family_total = 0;
    match resolve_family_group(&session, &config).await {
        Ok(group_id) => {
            let family_tasks: Vec<BoxFuture<'static, Outcome<u64>>> = (0..config
                .family_concurrency())
                .map(|i| {
                    let session = Arc::clone(&session);
                    let group_id = group_id.clone();
                    let label = format!("family sign-in #{}", i + 1);
                    async move {
                        with_retry(policy, &label, |_| {
                            let session = Arc::clone(&session);
                            let group_id = group_id.clone();
                            let label = label.clone();
                            async move {
                                guard(session.family_sign(&group_id), timeout, &label)
                                    .await
                                    .map(|bonus| bonus.bonus_mb)
                            }
                        })
                        .await
                    }
                    .boxed()
                })
                .collect();

            let family_outcomes =
                run_batch(family_tasks, config.family_concurrency(), "family sign-in").await;
            let (total, family_ok) = tally(&family_outcomes, &telemetry);
            family_total = total;
            lines.push(format!(
                "family sign-in: +{family_total}MB ({family_ok}/{} succeeded)",
                config.family_concurrency()
            ));
        }
        Err(err) => {
            telemetry.record_sign_failure();
            lines.push(format!("family sign-in skipped: {err}"));
        }
    }

    tracing::debug!(
        account = %masked,
        personal_mb = personal_total,
        family_mb = family_total,
        "account workflow complete"
    );
    AccountResult::succeeded(masked, personal_total, family_total, lines.join("\n"))
}

/// Picks the family group to sign against: the configured id when it exists
/// among the account's groups, otherwise the account's first group.
async fn resolve_family_group(
    session: &Arc<dyn CloudSession>,
    config: &OrchestratorConfig,
) -> Outcome<String> {
    let groups = guard(
        session.list_family_groups(),
        config.operation_timeout(),
        "family group lookup",
    )
    .await?;

    if let Some(preferred) = config.family_group_id() {
        if groups.iter().any(|group| group.id == preferred) {
            return Ok(preferred.to_owned());
        }
        tracing::debug!(
            group = preferred,
            "configured family group not found; falling back to the first group"
        );
    }

    groups
        .into_iter()
        .next()
        .map(|group| group.id)
        .ok_or_else(|| SignError::Remote {
            label: "family group lookup".to_owned(),
            message: "account has no family groups".to_owned(),
        })
}

fn tally(outcomes: &[Outcome<u64>], telemetry: &Telemetry) -> (u64, usize) {
    let mut total = 0;
    let mut succeeded = 0;
    for outcome in outcomes {
        match outcome {
            Ok(bonus_mb) => {
                total += *bonus_mb;
                succeeded += 1;
                telemetry.record_sign_success(*bonus_mb);
            }
            Err(err) => {
                if err.is_timeout() {
                    telemetry.record_timeout();
                }
                telemetry.record_sign_failure();
            }
        }
    }
    (total, succeeded)
}
