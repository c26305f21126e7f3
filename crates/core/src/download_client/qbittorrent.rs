//! qBittorrent Web API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::ClientConfig;

use super::{ClientConnector, ClientFile, ClientTorrent, DownloadClient, DownloadClientError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    /// Session marker (cleared when the cookie is rejected).
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client. Does not log in.
    pub fn new(config: &ClientConfig, timeout: Duration) -> Result<Self, DownloadClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| DownloadClientError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url(&config.host, config.port),
            username: config.username.clone(),
            password: config.password.clone(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Login and store session cookie.
    pub async fn login(&self) -> Result<(), DownloadClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url);

        let params = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!(url = %self.base_url, "qBittorrent login successful");
            // Session cookie is stored by the cookie jar
            let mut session = self.session.write().await;
            *session = Some("authenticated".to_string());
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(DownloadClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(DownloadClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), DownloadClientError> {
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.login().await
    }

    /// Make an authenticated GET request.
    async fn get(&self, endpoint: &str) -> Result<String, DownloadClientError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.get(&url).send().await.map_err(map_send_error)?;

        let response = if response.status().as_u16() == 403 {
            // Session expired, retry after login
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.login().await?;
            self.client.get(&url).send().await.map_err(map_send_error)?
        } else {
            response
        };

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(DownloadClientError::TorrentNotFound(endpoint.to_string()));
        }
        if !status.is_success() {
            return Err(DownloadClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| DownloadClientError::ApiError(e.to_string()))
    }
}

fn base_url(host: &str, port: u16) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

fn map_send_error(e: reqwest::Error) -> DownloadClientError {
    if e.is_timeout() {
        DownloadClientError::Timeout
    } else if e.is_connect() {
        DownloadClientError::ConnectionFailed(e.to_string())
    } else {
        DownloadClientError::ApiError(e.to_string())
    }
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    #[serde(default)]
    save_path: String,
}

impl From<QBTorrentInfo> for ClientTorrent {
    fn from(info: QBTorrentInfo) -> Self {
        ClientTorrent {
            hash: info.hash.to_lowercase(),
            name: info.name,
            save_path: info.save_path,
        }
    }
}

/// qBittorrent torrent file response.
#[derive(Debug, Deserialize)]
struct QBTorrentFile {
    name: String,
    #[serde(default)]
    size: i64,
}

impl From<QBTorrentFile> for ClientFile {
    fn from(file: QBTorrentFile) -> Self {
        ClientFile {
            name: file.name,
            size: file.size.max(0) as u64,
        }
    }
}

#[async_trait]
impl DownloadClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn list_torrents(&self) -> Result<Vec<ClientTorrent>, DownloadClientError> {
        let response = self.get("/api/v2/torrents/info").await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response).map_err(|e| {
            DownloadClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(torrents.into_iter().map(ClientTorrent::from).collect())
    }

    async fn list_files(&self, hash: &str) -> Result<Vec<ClientFile>, DownloadClientError> {
        let endpoint = format!(
            "/api/v2/torrents/files?hash={}",
            urlencoding::encode(&hash.to_lowercase())
        );
        let response = self.get(&endpoint).await?;
        let files: Vec<QBTorrentFile> = serde_json::from_str(&response).map_err(|e| {
            DownloadClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(files.into_iter().map(ClientFile::from).collect())
    }
}

/// Connector producing logged-in qBittorrent handles.
pub struct QBittorrentConnector {
    timeout: Duration,
}

impl QBittorrentConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for QBittorrentConnector {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl ClientConnector for QBittorrentConnector {
    async fn connect(
        &self,
        config: &ClientConfig,
    ) -> Result<Arc<dyn DownloadClient>, DownloadClientError> {
        let client = QBittorrentClient::new(config, self.timeout)?;
        client.login().await?;
        Ok(Arc::new(client))
    }
}
