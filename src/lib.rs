pub mod client;
pub mod exec;
pub mod orchestrator;
pub mod runtime;

pub use client::{
    CloudClient, CloudSession, FamilyGroup, HttpCloudClient, LogNotifier, NotifySink, SignBonus,
    WebhookNotifier,
};
pub use exec::{guard, run_batch, with_retry, Outcome, RetryPolicy, SignError};
pub use orchestrator::{run_account, AccountResult, AggregateReport, Orchestrator};
pub use runtime::{init_tracing, load_accounts, mask, Account, OrchestratorConfig, Telemetry};
