use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

pub use crate::release::FuzzyMatching;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Download clients by name. Requests without a client name use `default`.
    #[serde(default)]
    pub clients: HashMap<String, ClientConfig>,
    #[serde(default)]
    pub fuzzy_matching: FuzzyMatching,
    #[serde(default)]
    pub smart_mode: SmartModeConfig,
    #[serde(default)]
    pub pack: PackConfig,
    #[serde(default)]
    pub tvmaze: TvMazeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on the handling time of a single request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    42069
}

fn default_request_timeout() -> u64 {
    60
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Token expected in `X-API-Token` or `?apikey=`. Empty disables auth.
    #[serde(default)]
    pub api_token: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A qBittorrent instance and where its packs are assembled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_host")]
    pub host: String,
    #[serde(default = "default_client_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Directory scanned by the downstream importer.
    #[serde(default)]
    pub pre_import_path: PathBuf,
}

fn default_client_host() -> String {
    "127.0.0.1".to_string()
}

fn default_client_port() -> u16 {
    8080
}

/// Smart mode: require a share of the season to be present.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmartModeConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Minimum matched/total episode ratio, within [0, 1].
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for SmartModeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> f64 {
    0.75
}

/// Pack phase behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackConfig {
    /// Defer hardlinking until the pack's torrent file is posted to /parse.
    #[serde(default)]
    pub parse_torrent_file: bool,
    /// How long pending matches wait for their parse call.
    #[serde(default = "default_pending_ttl")]
    pub pending_match_ttl_secs: u64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            parse_torrent_file: false,
            pending_match_ttl_secs: default_pending_ttl(),
        }
    }
}

impl PackConfig {
    pub fn pending_match_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_match_ttl_secs)
    }
}

fn default_pending_ttl() -> u64 {
    900
}

/// TVMaze configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TvMazeConfig {
    #[serde(default = "default_tvmaze_url")]
    pub base_url: String,
    #[serde(default = "default_tvmaze_timeout")]
    pub timeout_secs: u64,
}

impl Default for TvMazeConfig {
    fn default() -> Self {
        Self {
            base_url: default_tvmaze_url(),
            timeout_secs: default_tvmaze_timeout(),
        }
    }
}

fn default_tvmaze_url() -> String {
    "https://api.tvmaze.com".to_string()
}

fn default_tvmaze_timeout() -> u64 {
    30
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub auth: SanitizedAuthConfig,
    pub logging: LoggingConfig,
    pub clients: HashMap<String, SanitizedClientConfig>,
    pub fuzzy_matching: FuzzyMatching,
    pub smart_mode: SmartModeConfig,
    pub pack: PackConfig,
    pub tvmaze: TvMazeConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub api_token_configured: bool,
}

/// Sanitized client config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedClientConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password_configured: bool,
    pub pre_import_path: PathBuf,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            auth: SanitizedAuthConfig {
                api_token_configured: !config.auth.api_token.is_empty(),
            },
            logging: config.logging.clone(),
            clients: config
                .clients
                .iter()
                .map(|(name, client)| {
                    (
                        name.clone(),
                        SanitizedClientConfig {
                            host: client.host.clone(),
                            port: client.port,
                            username: client.username.clone(),
                            password_configured: !client.password.is_empty(),
                            pre_import_path: client.pre_import_path.clone(),
                        },
                    )
                })
                .collect(),
            fuzzy_matching: config.fuzzy_matching.clone(),
            smart_mode: config.smart_mode.clone(),
            pack: config.pack.clone(),
            tvmaze: config.tvmaze.clone(),
        }
    }
}
