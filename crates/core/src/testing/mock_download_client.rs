//! Mock download client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::download_client::{
    ClientConnector, ClientFile, ClientTorrent, DownloadClient, DownloadClientError,
};

/// Mock implementation of the DownloadClient trait.
///
/// Clones share state, so a test can keep one handle for setup and
/// assertions while the code under test holds another.
///
/// # Example
///
/// ```rust,ignore
/// let client = MockDownloadClient::new();
/// client
///     .add_torrent("Series.S01E01.1080p.WEB-DL.H.264-RlsGrp", "/downloads", 1_000)
///     .await;
///
/// let torrents = client.list_torrents().await?;
/// assert_eq!(torrents.len(), 1);
/// assert_eq!(client.list_calls().await, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockDownloadClient {
    torrents: Arc<RwLock<Vec<ClientTorrent>>>,
    files: Arc<RwLock<HashMap<String, Vec<ClientFile>>>>,
    /// Hashes whose file listing fails.
    failing_files: Arc<RwLock<HashSet<String>>>,
    /// If set, the next list_torrents call fails with this error.
    next_error: Arc<RwLock<Option<DownloadClientError>>>,
    /// Simulated latency of list_torrents.
    latency: Arc<RwLock<Duration>>,
    list_calls: Arc<RwLock<usize>>,
}

impl MockDownloadClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single-file torrent whose only file is `<name>.mkv`.
    ///
    /// Returns the generated hash.
    pub async fn add_torrent(&self, name: &str, save_path: &str, size: u64) -> String {
        let file = ClientFile {
            name: format!("{}.mkv", name),
            size,
        };
        self.add_torrent_with_files(name, save_path, vec![file]).await
    }

    /// Add a torrent with an explicit file list. Returns the generated hash.
    pub async fn add_torrent_with_files(
        &self,
        name: &str,
        save_path: &str,
        files: Vec<ClientFile>,
    ) -> String {
        let mut torrents = self.torrents.write().await;
        let hash = format!("{:040x}", torrents.len() + 1);
        torrents.push(ClientTorrent {
            hash: hash.clone(),
            name: name.to_string(),
            save_path: save_path.to_string(),
        });
        self.files.write().await.insert(hash.clone(), files);
        hash
    }

    /// Make list_files fail for a torrent.
    pub async fn fail_files_for(&self, hash: &str) {
        self.failing_files.write().await.insert(hash.to_string());
    }

    /// Set an error to be returned by the next list_torrents call.
    pub async fn set_next_error(&self, error: DownloadClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every list_torrents call by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    /// Number of list_torrents calls made so far.
    pub async fn list_calls(&self) -> usize {
        *self.list_calls.read().await
    }
}

#[async_trait]
impl DownloadClient for MockDownloadClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_torrents(&self) -> Result<Vec<ClientTorrent>, DownloadClientError> {
        *self.list_calls.write().await += 1;

        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(self.torrents.read().await.clone())
    }

    async fn list_files(&self, hash: &str) -> Result<Vec<ClientFile>, DownloadClientError> {
        if self.failing_files.read().await.contains(hash) {
            return Err(DownloadClientError::ApiError("HTTP 500".to_string()));
        }

        self.files
            .read()
            .await
            .get(hash)
            .cloned()
            .ok_or_else(|| DownloadClientError::TorrentNotFound(hash.to_string()))
    }
}

/// Connector handing out clones of one `MockDownloadClient`.
#[derive(Debug, Default)]
pub struct MockConnector {
    client: MockDownloadClient,
    connects: Arc<RwLock<usize>>,
    next_error: Arc<RwLock<Option<DownloadClientError>>>,
}

impl MockConnector {
    pub fn new(client: MockDownloadClient) -> Self {
        Self {
            client,
            connects: Arc::new(RwLock::new(0)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// The shared client handed to callers.
    pub fn client(&self) -> &MockDownloadClient {
        &self.client
    }

    /// Number of connect (login) attempts made so far.
    pub async fn connect_count(&self) -> usize {
        *self.connects.read().await
    }

    /// Set an error to be returned by the next connect call.
    pub async fn set_next_error(&self, error: DownloadClientError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl ClientConnector for MockConnector {
    async fn connect(
        &self,
        _config: &ClientConfig,
    ) -> Result<Arc<dyn DownloadClient>, DownloadClientError> {
        *self.connects.write().await += 1;
        tokio::task::yield_now().await;

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(Arc::new(self.client.clone()))
    }
}
