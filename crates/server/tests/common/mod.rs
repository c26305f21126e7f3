//! Common test utilities for HTTP testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with a mock download client and episode counter, so the webhooks can be
//! exercised without qBittorrent or TVMaze.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::watch;
use tower::ServiceExt;

use packlink_core::{
    testing::{MockConnector, MockDownloadClient, MockEpisodeCounter},
    Config, SeasonPackService,
};
use packlink_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use packlink_core::testing::fixtures;

/// Test fixture holding the router and its mocks.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_pack() {
///     let fixture = TestFixture::new();
///     fixture.add_episode(1).await;
///
///     let response = fixture.post("/api/pack", json!({ "name": PACK })).await;
///
///     assert_eq!(response.status.as_u16(), 250);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock download client - add torrents here
    pub client: MockDownloadClient,
    /// Mock episode counter - configure smart mode totals
    pub episodes: MockEpisodeCounter,
    /// Directory the mock client's torrents live in
    pub downloads: TempDir,
    /// Pre-import directory of the `default` client
    pub pre_import: TempDir,
    /// Publishes config changes
    pub config_tx: watch::Sender<Arc<Config>>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with authentication disabled.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test fixture with an adjusted configuration.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let downloads = TempDir::new().expect("Failed to create downloads dir");
        let pre_import = TempDir::new().expect("Failed to create pre-import dir");

        let mut config = fixtures::config(pre_import.path());
        adjust(&mut config);
        let (config_tx, config_rx) = watch::channel(Arc::new(config));

        let client = MockDownloadClient::new();
        let episodes = MockEpisodeCounter::new();
        let service = SeasonPackService::new(
            config_rx.clone(),
            Arc::new(MockConnector::new(client.clone())),
            Arc::new(episodes.clone()),
        );

        let state = Arc::new(AppState::new(config_rx, Arc::new(service)));
        let router = create_router(state);

        Self {
            router,
            client,
            episodes,
            downloads,
            pre_import,
            config_tx,
        }
    }

    /// Add a single-episode torrent of `Series` season 1 and write its file.
    pub async fn add_episode(&self, episode: u32) -> PathBuf {
        let name = fixtures::episode_name("Series", 1, episode, "1080p.WEB-DL.H.264-RlsGrp");
        let path = self.downloads.path().join(format!("{}.mkv", name));
        tokio::fs::write(&path, format!("episode {}", episode))
            .await
            .expect("Failed to write episode");
        self.client
            .add_torrent(
                &name,
                &self.downloads.path().to_string_lossy(),
                1_000_000 + u64::from(episode),
            )
            .await;
        path
    }

    /// Publish a modified configuration.
    pub fn update_config(&self, adjust: impl FnOnce(&mut Config)) {
        let mut config = Config::clone(&self.config_tx.borrow());
        adjust(&mut config);
        self.config_tx.send_replace(Arc::new(config));
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body.to_string()), &[]).await
    }

    pub async fn post_with_headers(
        &self,
        path: &str,
        body: Value,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.request("POST", path, Some(body.to_string()), headers)
            .await
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some(body.to_string()), &[]).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<String>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }

        let body = match body {
            Some(body) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(body)
            }
            None => Body::empty(),
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
