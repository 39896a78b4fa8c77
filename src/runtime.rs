//! Runtime glue: account loading, validated configuration, logging setup,
//! and telemetry counters.

pub mod accounts;
pub mod config;
pub mod telemetry;

pub use accounts::{load_accounts, mask, Account};
pub use config::{OrchestratorConfig, OrchestratorConfigBuilder};
pub use telemetry::{init_tracing, spawn_metrics_reporter, Telemetry, TelemetrySnapshot};
