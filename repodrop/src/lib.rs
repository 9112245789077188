//! # repodrop: commit uploads to a GitHub repository
//!
//! `repodrop` is a single-purpose upload endpoint. A client POSTs a `multipart/form-data` body
//! with a file under `files[]`; the file is committed to a configured GitHub repository through
//! the contents API under a short random name, and the response carries the public URL the file
//! will be served from (typically a CDN or GitHub Pages domain in front of the repository).
//!
//! ## Request Flow
//!
//! Every request runs the same linear pipeline in [`api::handlers::upload::upload_file`]:
//!
//! 1. Anything but POST is answered with a plain-text 405.
//! 2. If the GitHub token, owner, repository or public base URL is missing, the request is refused
//!    with a 500 before the body is read.
//! 3. The multipart body is streamed. The first file under the upload field is buffered in
//!    memory; all other parts are drained and dropped.
//! 4. The file gets a name like `Qx3_k.png` ([`naming`]), is base64 encoded and committed with a
//!    single `PUT /repos/{owner}/{repo}/contents/{name}` ([`content_store`]).
//! 5. The response is `{"files":[{"url":"{base_url}/{name}"}]}`.
//!
//! Nothing is shared between requests except the read-only [`AppState`]. There are no retries:
//! a failed commit is reported to the caller, who has to upload again.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use repodrop::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = repodrop::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     repodrop::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod content_store;
pub mod errors;
pub mod naming;
mod openapi;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use crate::{api::handlers::upload::upload_file, content_store::ContentStore, openapi::ApiDoc};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{any, get},
};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// Both fields are read-only after startup, so handlers share them without locking.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(Arc::new(config))
///     .store(Arc::new(store))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ContentStore>,
}

/// Build the application router.
///
/// The upload handler is routed for every method on `/` and `/api/upload` and does its own method
/// check, so non-POST requests get the handler's plain-text 405 rather than axum's empty one.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(upload_file))
        .route("/api/upload", any(upload_file))
        // Size is enforced per file by `upload.max_file_size`, not per request body
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// The HTTP server and the resources it owns.
///
/// 1. **Create**: [`Application::new`] builds the GitHub client, state and router
/// 2. **Serve**: [`Application::serve`] binds to `host:port` and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Arc<Config>,
}

impl Application {
    /// Create a new application instance backed by the GitHub contents API
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting repodrop with configuration: {:#?}", config);

        let missing = config.missing_settings();
        if !missing.is_empty() {
            warn!(
                "Missing required configuration ({}); every upload will be refused until it is set",
                missing.join(", ")
            );
        }

        let store = content_store::create_store(&config.github)?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Create an application instance around an arbitrary content store
    pub fn with_store(config: Config, store: Arc<dyn ContentStore>) -> Self {
        let config = Arc::new(config);
        let state = AppState::builder().config(config.clone()).store(store).build();

        Self {
            router: build_router(state),
            config,
        }
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("repodrop listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
