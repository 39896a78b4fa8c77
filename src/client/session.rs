use anyhow::Result;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Reward granted by a single sign-in call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignBonus {
    pub bonus_mb: u64,
    /// The service grants the bonus once per period; later calls in the same
    /// period succeed but report the duplicate here.
    pub already_signed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyGroup {
    pub id: String,
}

/// Authenticated session against the cloud storage service.
///
/// These are the only remote operations the orchestrator knows about; all
/// wire-level semantics live behind this boundary.
pub trait CloudSession: Send + Sync {
    fn personal_sign(&self) -> BoxFuture<'_, Result<SignBonus>>;

    fn list_family_groups(&self) -> BoxFuture<'_, Result<Vec<FamilyGroup>>>;

    fn family_sign<'a>(&'a self, group_id: &'a str) -> BoxFuture<'a, Result<SignBonus>>;
}

/// Entry point into the remote service: exchanges credentials for a session.
pub trait CloudClient: Send + Sync {
    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn CloudSession>>>;
}
