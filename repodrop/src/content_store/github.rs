//! GitHub contents API client
//!
//! Writes files with `PUT /repos/{owner}/{repo}/contents/{path}`, the "create or update file
//! contents" endpoint. Only creation is used: no `sha` is sent, so writing over an existing path is
//! rejected by GitHub with 422 and surfaces as [`StoreError::Rejected`].

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{CommitReceipt, CommitRequest, ContentStore, RepoTarget, Result, StoreError};
use crate::config::GithubConfig;

pub const ACCEPT_HEADER: &str = "application/vnd.github+json";

/// Content store backed by a GitHub repository
#[derive(Debug, Clone)]
pub struct GithubContentStore {
    client: Client,
    api_url: Url,
}

impl GithubContentStore {
    /// Create a store with an HTTP client honouring the configured timeout
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let api_url = Url::parse(&config.api_url).map_err(|e| StoreError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, api_url })
    }

    /// `{api_url}/repos/{owner}/{repo}/contents/{path}`, each segment percent-encoded
    fn contents_url(&self, target: &RepoTarget, path: &str) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(format!("{} cannot be a base URL", self.api_url)))?
            .pop_if_empty()
            .extend(["repos", target.owner.as_str(), target.repo.as_str(), "contents", path]);
        Ok(url)
    }
}

/// Pull `message` out of a GitHub error body
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl ContentStore for GithubContentStore {
    #[instrument(skip(self, target, commit), fields(owner = %target.owner, repo = %target.repo, branch = %commit.branch))]
    async fn put_file(&self, target: &RepoTarget, path: &str, commit: &CommitRequest) -> Result<CommitReceipt> {
        let url = self.contents_url(target, path)?;

        debug!("Committing {} bytes (base64) to {}", commit.content.len(), url);

        let response = self
            .client
            .put(url)
            .header(AUTHORIZATION, format!("token {}", target.token))
            .header(USER_AGENT, target.owner.as_str())
            .header(ACCEPT, ACCEPT_HEADER)
            .json(commit)
            .send()
            .await?;

        let status = response.status();
        // A body that cannot be read still leaves the status to report
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(StoreError::Rejected {
                status,
                message: error_message(&body),
                body,
            });
        }

        let sha = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.pointer("/content/sha").and_then(Value::as_str).map(str::to_string));

        Ok(CommitReceipt { sha })
    }
}
