use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PERSONAL_CONCURRENCY: usize = 10;
const DEFAULT_FAMILY_CONCURRENCY: usize = 8;
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(45);
const DEFAULT_ACCOUNT_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_RETRY_ATTEMPTS: usize = 2;
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

/// Runtime configuration for a check-in run.
///
/// All instances go through [`OrchestratorConfig::builder`] so invariants
/// are validated before any consumer observes the values. Personal and
/// family concurrency are independent knobs; neither is ever derived from
/// the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    personal_concurrency: usize,
    family_concurrency: usize,
    operation_timeout: Duration,
    account_interval: Duration,
    retry_attempts: usize,
    retry_base_delay: Duration,
    family_group_id: Option<String>,
    metrics_interval: Duration,
}

impl OrchestratorConfig {
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }

    /// Builds a configuration from `CLOUDSIGN_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(value) = env_parse::<usize>("CLOUDSIGN_PERSONAL_CONCURRENCY")? {
            builder = builder.personal_concurrency(value);
        }
        if let Some(value) = env_parse::<usize>("CLOUDSIGN_FAMILY_CONCURRENCY")? {
            builder = builder.family_concurrency(value);
        }
        if let Some(value) = env_parse::<u64>("CLOUDSIGN_OPERATION_TIMEOUT_MS")? {
            builder = builder.operation_timeout(Duration::from_millis(value));
        }
        if let Some(value) = env_parse::<u64>("CLOUDSIGN_ACCOUNT_INTERVAL_MS")? {
            builder = builder.account_interval(Duration::from_millis(value));
        }
        if let Some(value) = env_parse::<usize>("CLOUDSIGN_RETRY_ATTEMPTS")? {
            builder = builder.retry_attempts(value);
        }
        if let Some(value) = env_parse::<u64>("CLOUDSIGN_RETRY_BASE_DELAY_MS")? {
            builder = builder.retry_base_delay(Duration::from_millis(value));
        }
        if let Some(value) = env_parse::<u64>("CLOUDSIGN_METRICS_INTERVAL_MS")? {
            builder = builder.metrics_interval(Duration::from_millis(value));
        }
        if let Ok(value) = std::env::var("CLOUDSIGN_FAMILY_GROUP_ID") {
            builder = builder.family_group_id(value);
        }

        builder.build()
    }

    /// Number of overlapping personal sign-in attempts per account.
    pub fn personal_concurrency(&self) -> usize {
        self.personal_concurrency
    }

    /// Number of overlapping family sign-in attempts per account.
    pub fn family_concurrency(&self) -> usize {
        self.family_concurrency
    }

    /// Deadline applied by the timeout guard to every remote operation.
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Minimum spacing between consecutive account launches.
    pub fn account_interval(&self) -> Duration {
        self.account_interval
    }

    /// Attempt budget per sign-in call, counting the initial invocation.
    pub fn retry_attempts(&self) -> usize {
        self.retry_attempts
    }

    /// Base delay for the retry policy's linear backoff.
    pub fn retry_base_delay(&self) -> Duration {
        self.retry_base_delay
    }

    /// Preferred family group; the workflow falls back to the account's
    /// first group when unset or not found among the account's groups.
    pub fn family_group_id(&self) -> Option<&str> {
        self.family_group_id.as_deref()
    }

    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    pub fn validate(&self) -> Result<()> {
        if self.personal_concurrency == 0 {
            bail!("personal_concurrency must be greater than 0");
        }
        if self.family_concurrency == 0 {
            bail!("family_concurrency must be greater than 0");
        }
        if self.operation_timeout.is_zero() {
            bail!("operation_timeout must be greater than 0");
        }
        if self.retry_attempts == 0 {
            bail!("retry_attempts must be at least 1");
        }
        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }
        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            personal_concurrency: DEFAULT_PERSONAL_CONCURRENCY,
            family_concurrency: DEFAULT_FAMILY_CONCURRENCY,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            account_interval: DEFAULT_ACCOUNT_INTERVAL,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            family_group_id: None,
            metrics_interval: DEFAULT_METRICS_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfigBuilder {
    config: OrchestratorConfig,
}

impl OrchestratorConfigBuilder {
    pub fn personal_concurrency(mut self, count: usize) -> Self {
        self.config.personal_concurrency = count;
        self
    }

    pub fn family_concurrency(mut self, count: usize) -> Self {
        self.config.family_concurrency = count;
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = timeout;
        self
    }

    pub fn account_interval(mut self, interval: Duration) -> Self {
        self.config.account_interval = interval;
        self
    }

    pub fn retry_attempts(mut self, attempts: usize) -> Self {
        self.config.retry_attempts = attempts;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.config.retry_base_delay = delay;
        self
    }

    /// An empty or whitespace-only id means "no preference".
    pub fn family_group_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into().trim().to_owned();
        self.config.family_group_id = (!id.is_empty()).then_some(id);
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.config.metrics_interval = interval;
        self
    }

    pub fn build(self) -> Result<OrchestratorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            let value = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("invalid {name}: {raw:?}"))?;
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}
