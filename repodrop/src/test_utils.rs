//! Test utilities: a recording content store and server constructors.

use crate::config::Config;
use crate::content_store::{CommitReceipt, CommitRequest, ContentStore, RepoTarget, Result, StoreError};
use crate::{AppState, build_router};
use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use std::sync::{Arc, Mutex};

/// reqwest is built without a bundled crypto provider; install the one `main` uses.
pub fn install_crypto_provider() {
    // Err means another test already installed it
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// One `put_file` call as seen by [`RecordingStore`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub target: RepoTarget,
    pub path: String,
    pub commit: CommitRequest,
}

/// Content store stub that records every call and answers with a fixed outcome
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<RecordedCall>>,
    rejection: Option<(StatusCode, Option<String>)>,
}

impl RecordingStore {
    /// A store whose writes always fail with the given status and remote message
    pub fn rejecting(status: StatusCode, message: Option<&str>) -> Self {
        Self {
            calls: Mutex::default(),
            rejection: Some((status, message.map(str::to_string))),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("recording store lock poisoned").clone()
    }
}

#[async_trait]
impl ContentStore for RecordingStore {
    async fn put_file(&self, target: &RepoTarget, path: &str, commit: &CommitRequest) -> Result<CommitReceipt> {
        self.calls.lock().expect("recording store lock poisoned").push(RecordedCall {
            target: target.clone(),
            path: path.to_string(),
            commit: commit.clone(),
        });

        match &self.rejection {
            Some((status, message)) => Err(StoreError::Rejected {
                status: *status,
                message: message.clone(),
                body: message
                    .as_ref()
                    .map(|m| serde_json::json!({ "message": m }).to_string())
                    .unwrap_or_default(),
            }),
            None => Ok(CommitReceipt {
                sha: Some("0000000000000000000000000000000000000000".to_string()),
            }),
        }
    }
}

/// A complete configuration pointing at `octocat/cdn`
pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        base_url: Some("https://cdn.example.com".to_string()),
        ..Default::default()
    };
    config.github.token = Some("ghp_test".to_string());
    config.github.owner = Some("octocat".to_string());
    config.github.repo = Some("cdn".to_string());
    config
}

/// Test server over the real router, backed by the given store
pub fn create_test_server(config: Config, store: Arc<dyn ContentStore>) -> TestServer {
    let state = AppState::builder().config(Arc::new(config)).store(store).build();
    TestServer::new(build_router(state)).expect("Failed to create test server")
}
