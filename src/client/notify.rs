use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;

/// Delivery channel for the final aggregate report.
///
/// Implementations may fail; the orchestrator logs and swallows those
/// failures, so a broken channel can never mark the run itself as failed.
pub trait NotifySink: Send + Sync {
    fn send<'a>(&'a self, title: &'a str, body: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Posts the report as JSON to a configured webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into().trim().to_owned();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("webhook URL must start with http:// or https://");
        }
        Ok(Self {
            http: Client::new(),
            url,
        })
    }
}

impl NotifySink for WebhookNotifier {
    fn send<'a>(&'a self, title: &'a str, body: &'a str) -> BoxFuture<'a, Result<()>> {
        async move {
            self.http
                .post(&self.url)
                .json(&serde_json::json!({ "title": title, "body": body }))
                .send()
                .await
                .context("webhook request failed")?
                .error_for_status()
                .context("webhook rejected notification")?;
            Ok(())
        }
        .boxed()
    }
}

/// Fallback sink used when no webhook is configured: the report goes to the
/// log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotifySink for LogNotifier {
    fn send<'a>(&'a self, title: &'a str, body: &'a str) -> BoxFuture<'a, Result<()>> {
        async move {
            tracing::info!(title, "{body}");
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_url_must_carry_an_http_scheme() {
        let err = WebhookNotifier::new("notify.example/hook").unwrap_err();
        assert!(format!("{err}").contains("http:// or https://"));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        assert!(LogNotifier.send("title", "body").await.is_ok());
    }
}
