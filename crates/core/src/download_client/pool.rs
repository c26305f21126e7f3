use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::info;

use crate::config::ClientConfig;

use super::{ClientConnector, ClientKey, DownloadClient, DownloadClientError};

type Handle = Arc<dyn DownloadClient>;

/// Cache of authenticated client handles, one per connection configuration.
///
/// Concurrent first callers for the same key share a single login. A failed
/// login leaves the slot empty so the next call retries.
pub struct ClientPool {
    connector: Arc<dyn ClientConnector>,
    handles: Mutex<HashMap<ClientKey, Arc<OnceCell<Handle>>>>,
}

impl ClientPool {
    pub fn new(connector: Arc<dyn ClientConnector>) -> Self {
        Self {
            connector,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached handle for `config`, logging in on first use.
    pub async fn get(&self, config: &ClientConfig) -> Result<Handle, DownloadClientError> {
        let key = ClientKey::from(config);
        let cell = {
            let mut handles = self.handles.lock().unwrap();
            handles.entry(key).or_default().clone()
        };

        let handle = cell
            .get_or_try_init(|| async {
                info!(host = %config.host, port = config.port, "logging in to download client");
                self.connector.connect(config).await
            })
            .await?;

        Ok(handle.clone())
    }

    /// Number of configurations with a live handle.
    pub fn len(&self) -> usize {
        let handles = self.handles.lock().unwrap();
        handles.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
