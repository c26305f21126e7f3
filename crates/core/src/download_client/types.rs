//! Types for download client operations.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClientConfig;

/// Errors that can occur during download client operations.
#[derive(Debug, Error)]
pub enum DownloadClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// A torrent as listed by the download client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTorrent {
    /// Info hash (lowercase hex).
    pub hash: String,
    /// Torrent name.
    pub name: String,
    /// Directory the torrent's content lives in.
    pub save_path: String,
}

/// A file inside a client torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFile {
    /// Path relative to the torrent's save path.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Identity of a client connection configuration.
///
/// Two configurations with the same key share a login and a listing cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl From<&ClientConfig> for ClientKey {
    fn from(config: &ClientConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// Read-only view of a download client.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// List all torrents.
    async fn list_torrents(&self) -> Result<Vec<ClientTorrent>, DownloadClientError>;

    /// List the files of a torrent.
    async fn list_files(&self, hash: &str) -> Result<Vec<ClientFile>, DownloadClientError>;
}

/// Produces authenticated client handles from configuration.
#[async_trait]
pub trait ClientConnector: Send + Sync {
    /// Create a handle and log in.
    async fn connect(
        &self,
        config: &ClientConfig,
    ) -> Result<Arc<dyn DownloadClient>, DownloadClientError>;
}
