//! Multi-account orchestration: the per-account workflow, aggregate
//! reporting, and the staggered concurrent runner.

pub mod report;
pub mod runner;
pub mod workflow;

pub use report::{AccountResult, AggregateReport};
pub use runner::Orchestrator;
pub use workflow::run_account;
