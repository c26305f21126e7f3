use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{load_config, validate_config, Config, ConfigError};

/// Polls a config file and publishes validated snapshots.
///
/// Readers hold a `watch::Receiver<Arc<Config>>` and take one snapshot per
/// request. Files that fail to parse or validate are ignored and the
/// previous snapshot stays current.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    sender: watch::Sender<Arc<Config>>,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(
        path: impl Into<PathBuf>,
        initial: Config,
        poll_interval: Duration,
    ) -> (Self, watch::Receiver<Arc<Config>>) {
        let path = path.into();
        let (sender, receiver) = watch::channel(Arc::new(initial));
        let last_modified = modified_time(&path);

        (
            Self {
                path,
                poll_interval,
                sender,
                last_modified,
            },
            receiver,
        )
    }

    /// Another receiver for the same snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Config>> {
        self.sender.subscribe()
    }

    /// Reload if the file changed since the last check.
    ///
    /// Returns `Ok(true)` when a new snapshot was published.
    pub fn check(&mut self) -> Result<bool, ConfigError> {
        let modified = modified_time(&self.path);
        if modified == self.last_modified {
            return Ok(false);
        }
        self.last_modified = modified;

        let config = load_config(&self.path)?;
        validate_config(&config)?;

        self.sender.send_replace(Arc::new(config));
        Ok(true)
    }

    /// Poll in the background until every receiver is dropped.
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if self.sender.is_closed() {
                    debug!("config watcher stopping, no receivers left");
                    break;
                }
                match self.check() {
                    Ok(true) => info!(path = %self.path.display(), "configuration reloaded"),
                    Ok(false) => {}
                    Err(e) => warn!(
                        path = %self.path.display(),
                        error = %e,
                        "ignoring invalid configuration change"
                    ),
                }
            }
        })
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
