//! Remote content store abstraction
//!
//! This module defines the `ContentStore` trait, the single write primitive the upload handler
//! needs: "create a file at this path on this branch". The production implementation talks to the
//! GitHub contents API ([`github::GithubContentStore`]); tests substitute a recording stub.

use async_trait::async_trait;
use axum::http::StatusCode;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;

use crate::config::GithubConfig;

pub mod github;

/// Create the content store used by the application
pub fn create_store(config: &GithubConfig) -> Result<github::GithubContentStore> {
    github::GithubContentStore::new(config)
}

/// Result type for content store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while writing to the remote store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The remote answered with a non-2xx status
    #[error("Remote store rejected the write with status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: StatusCode,
        /// `message` field of the remote JSON error body, if any
        message: Option<String>,
        /// Raw response body, kept for logging
        body: String,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("Remote store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid remote store URL: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    /// Text surfaced to the client as `details`.
    ///
    /// For a rejection this is the remote's own message (absent if the remote sent none),
    /// otherwise the local error text.
    pub fn details(&self) -> Option<String> {
        match self {
            StoreError::Rejected { message, .. } => message.clone(),
            StoreError::Transport(e) => Some(e.to_string()),
            StoreError::InvalidUrl(msg) => Some(msg.clone()),
        }
    }
}

/// Repository coordinates and credential for one write
#[derive(Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl std::fmt::Debug for RepoTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoTarget")
            .field("token", &"***")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish()
    }
}

/// Body of a "create or update file contents" call
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommitRequest {
    pub message: String,
    /// File content, standard base64 with padding
    pub content: String,
    pub branch: String,
}

impl CommitRequest {
    /// Build the commit for a freshly generated file name
    pub fn for_upload(name: &str, bytes: &[u8], branch: &str) -> Self {
        Self {
            message: format!("Upload: {name}"),
            content: STANDARD.encode(bytes),
            branch: branch.to_string(),
        }
    }
}

/// What the remote reported back after a successful write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Blob SHA of the stored file, when the remote reports it
    pub sha: Option<String>,
}

/// Abstract remote content store
///
/// Implementors persist a single file per call. No retries are expected: a failed write is
/// terminal for the request that issued it.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create a file at `path` in the target repository.
    async fn put_file(&self, target: &RepoTarget, path: &str, commit: &CommitRequest) -> Result<CommitReceipt>;
}
