//! Season-pack service.
//!
//! Drives the two request phases:
//! - **Pack**: an announced season pack is compared against the client's
//!   torrents, matching episodes are recorded and (unless deferred)
//!   hardlinked into the pre-import tree
//! - **Parse**: the pack's real torrent is decoded, each recorded episode
//!   is correlated with a file of the pack and linked under the pack's own
//!   file name
//!
//! All shared state (client logins, listing cache, pending matches) lives in
//! the service instance.

mod pack;
mod parse;
mod types;

pub use types::Failure;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{error, info};

use crate::config::Config;
use crate::download_client::{ClientConnector, ClientPool};
use crate::episodes::EpisodeCounter;
use crate::hardlink::{self, LinkOutcome};
use crate::listing::ListingCache;
use crate::matching::PendingMatchStore;
use crate::metrics::{ANNOUNCES_TOTAL, ANNOUNCE_DURATION, HARDLINKS_TOTAL};
use crate::status::Status;

/// Client used when a request does not name one.
pub const DEFAULT_CLIENT: &str = "default";

/// The season-pack matching service.
pub struct SeasonPackService {
    config: watch::Receiver<Arc<Config>>,
    clients: ClientPool,
    listings: ListingCache,
    pending: PendingMatchStore,
    episodes: Arc<dyn EpisodeCounter>,
}

impl SeasonPackService {
    /// Create a new service.
    ///
    /// The pending-match TTL is taken from the configuration at creation.
    pub fn new(
        config: watch::Receiver<Arc<Config>>,
        connector: Arc<dyn ClientConnector>,
        episodes: Arc<dyn EpisodeCounter>,
    ) -> Self {
        let ttl = config.borrow().pack.pending_match_ttl();

        Self {
            config,
            clients: ClientPool::new(connector),
            listings: ListingCache::new(),
            pending: PendingMatchStore::new(ttl),
            episodes,
        }
    }

    /// Pending matches recorded by the pack phase.
    pub fn pending(&self) -> &PendingMatchStore {
        &self.pending
    }

    /// Cached client listings.
    pub fn listings(&self) -> &ListingCache {
        &self.listings
    }

    /// One consistent configuration for the whole request.
    fn snapshot(&self) -> Arc<Config> {
        Arc::clone(&self.config.borrow())
    }

    /// Hardlink one episode, logging and counting the outcome.
    async fn link_episode(&self, source: &Path, target: &Path) -> bool {
        match hardlink::link(source, target).await {
            Ok(LinkOutcome::Created) => {
                HARDLINKS_TOTAL.with_label_values(&["created"]).inc();
                info!(
                    "Created hardlink: source({}), target({})",
                    source.display(),
                    target.display()
                );
                true
            }
            Ok(LinkOutcome::AlreadyLinked) => {
                HARDLINKS_TOTAL.with_label_values(&["already_linked"]).inc();
                info!(
                    "Hardlink already present: source({}), target({})",
                    source.display(),
                    target.display()
                );
                true
            }
            Err(e) => {
                HARDLINKS_TOTAL.with_label_values(&["failed"]).inc();
                error!(error = %e, "Failed to create hardlink for {}", source.display());
                false
            }
        }
    }
}

fn client_name_or_default(client_name: &str) -> &str {
    if client_name.is_empty() {
        info!("No client name given, using the default client");
        DEFAULT_CLIENT
    } else {
        client_name
    }
}

/// Count a finished request by phase and status code.
fn record(phase: &str, result: &Result<Status, Failure>, started: Instant) {
    let status = match result {
        Ok(status) => *status,
        Err(failure) => failure.status,
    };

    ANNOUNCES_TOTAL
        .with_label_values(&[phase, &status.as_label()])
        .inc();
    ANNOUNCE_DURATION
        .with_label_values(&[phase])
        .observe(started.elapsed().as_secs_f64());
}
