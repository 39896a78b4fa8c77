//! reqwest-backed implementation of the cloud session traits against a
//! configurable JSON API base URL.

use crate::client::session::{CloudClient, CloudSession, FamilyGroup, SignBonus};
use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpCloudClient {
    http: Client,
    base_url: Arc<String>,
}

impl HttpCloudClient {
    /// `request_timeout` is a transport-level backstop; the orchestrator's
    /// timeout guard still bounds every logical operation on top of it.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("api base URL must start with http:// or https://");
        }

        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
        })
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct SignResponse {
    bonus_mb: u64,
    #[serde(default)]
    already_signed: bool,
}

#[derive(Deserialize)]
struct GroupsResponse {
    groups: Vec<GroupEntry>,
}

#[derive(Deserialize)]
struct GroupEntry {
    id: String,
}

impl CloudClient for HttpCloudClient {
    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn CloudSession>>> {
        async move {
            let response = self
                .http
                .post(format!("{}/login", self.base_url))
                .json(&serde_json::json!({ "username": username, "password": password }))
                .send()
                .await
                .context("login request failed")?
                .error_for_status()
                .context("login rejected")?;

            let body: LoginResponse = response.json().await.context("malformed login response")?;

            Ok(Arc::new(HttpSession {
                http: self.http.clone(),
                base_url: Arc::clone(&self.base_url),
                token: body.token,
            }) as Arc<dyn CloudSession>)
        }
        .boxed()
    }
}

struct HttpSession {
    http: Client,
    base_url: Arc<String>,
    token: String,
}

impl HttpSession {
    async fn post_sign(&self, path: &str, body: Option<serde_json::Value>) -> Result<SignBonus> {
        let mut request = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{path} request failed"))?
            .error_for_status()
            .with_context(|| format!("{path} rejected"))?;

        let body: SignResponse = response
            .json()
            .await
            .with_context(|| format!("malformed {path} response"))?;

        Ok(SignBonus {
            bonus_mb: body.bonus_mb,
            already_signed: body.already_signed,
        })
    }
}

impl CloudSession for HttpSession {
    fn personal_sign(&self) -> BoxFuture<'_, Result<SignBonus>> {
        async move { self.post_sign("/sign/personal", None).await }.boxed()
    }

    fn list_family_groups(&self) -> BoxFuture<'_, Result<Vec<FamilyGroup>>> {
        async move {
            let response = self
                .http
                .get(format!("{}/family/groups", self.base_url))
                .bearer_auth(&self.token)
                .send()
                .await
                .context("family group request failed")?
                .error_for_status()
                .context("family group lookup rejected")?;

            let body: GroupsResponse = response
                .json()
                .await
                .context("malformed family group response")?;

            Ok(body
                .groups
                .into_iter()
                .map(|group| FamilyGroup { id: group.id })
                .collect())
        }
        .boxed()
    }

    fn family_sign<'a>(&'a self, group_id: &'a str) -> BoxFuture<'a, Result<SignBonus>> {
        async move {
            self.post_sign(
                "/sign/family",
                Some(serde_json::json!({ "group_id": group_id })),
            )
            .await
        }
        .boxed()
    }
}
