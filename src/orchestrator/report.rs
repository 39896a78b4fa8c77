use std::fmt;

/// Immutable outcome of one account's workflow.
///
/// Constructed once by the workflow, handed once to the orchestrator, and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountResult {
    masked_id: String,
    success: bool,
    personal_bonus_mb: u64,
    family_bonus_mb: u64,
    report: String,
}

impl AccountResult {
    pub fn succeeded(
        masked_id: impl Into<String>,
        personal_bonus_mb: u64,
        family_bonus_mb: u64,
        report: impl Into<String>,
    ) -> Self {
        Self {
            masked_id: masked_id.into(),
            success: true,
            personal_bonus_mb,
            family_bonus_mb,
            report: report.into(),
        }
    }

    pub fn failed(masked_id: impl Into<String>, report: impl Into<String>) -> Self {
        Self {
            masked_id: masked_id.into(),
            success: false,
            personal_bonus_mb: 0,
            family_bonus_mb: 0,
            report: report.into(),
        }
    }

    pub fn masked_id(&self) -> &str {
        &self.masked_id
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn personal_bonus_mb(&self) -> u64 {
        self.personal_bonus_mb
    }

    pub fn family_bonus_mb(&self) -> u64 {
        self.family_bonus_mb
    }

    pub fn report(&self) -> &str {
        &self.report
    }
}

/// Ordered per-account report fragments plus the grand-total family bonus.
///
/// Built incrementally by the orchestrator only, finalized once, then handed
/// to the notification sink.
#[derive(Debug, Default, Clone)]
pub struct AggregateReport {
    fragments: Vec<String>,
    total_family_bonus_mb: u64,
    failures: usize,
}

impl AggregateReport {
    /// Records a settled account. Only successful accounts contribute their
    /// family bonus to the grand total.
    pub fn record(&mut self, result: &AccountResult) {
        self.fragments.push(result.report().to_owned());
        if result.success() {
            self.total_family_bonus_mb += result.family_bonus_mb();
        } else {
            self.failures += 1;
        }
    }

    /// Records an account that never ran (configuration error, shutdown, or
    /// an unexpected task fault). Contributes nothing to the totals.
    pub fn record_skipped(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
        self.failures += 1;
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn account_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures
    }

    pub fn total_family_bonus_mb(&self) -> u64 {
        self.total_family_bonus_mb
    }

    pub fn title(&self) -> String {
        "cloud storage check-in report".to_owned()
    }

    /// Renders the notification body: one fragment per account in launch
    /// order, then the grand total.
    pub fn body(&self) -> String {
        let mut body = String::new();
        for fragment in &self.fragments {
            body.push_str(fragment);
            body.push_str("\n\n");
        }
        body.push_str(&format!(
            "family sign-in grand total: {}MB",
            self.total_family_bonus_mb
        ));
        body
    }
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body())
    }
}
