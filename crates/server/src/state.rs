use std::sync::Arc;

use packlink_core::{create_authenticator, Authenticator, Config, SanitizedConfig, SeasonPackService};
use tokio::sync::watch;

/// Shared application state
pub struct AppState {
    config: watch::Receiver<Arc<Config>>,
    service: Arc<SeasonPackService>,
}

impl AppState {
    pub fn new(config: watch::Receiver<Arc<Config>>, service: Arc<SeasonPackService>) -> Self {
        Self { config, service }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config.borrow())
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(self.config().as_ref())
    }

    /// Authenticator for the current API token, so token changes apply
    /// without a restart.
    pub fn authenticator(&self) -> Box<dyn Authenticator> {
        create_authenticator(&self.config().auth)
    }

    pub fn service(&self) -> &SeasonPackService {
        self.service.as_ref()
    }
}
