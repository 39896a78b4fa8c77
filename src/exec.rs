//! Concurrency primitives shared by the orchestrator: typed operation
//! outcomes, the timeout guard, the retry policy, and the windowed batch
//! executor.

pub mod batch;
pub mod guard;
pub mod outcome;
pub mod retry;

pub use batch::run_batch;
pub use guard::guard;
pub use outcome::{Outcome, SignError};
pub use retry::{with_retry, RetryPolicy};
