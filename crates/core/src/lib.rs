pub mod auth;
pub mod config;
pub mod download_client;
pub mod episodes;
pub mod hardlink;
pub mod listing;
pub mod matching;
pub mod metrics;
pub mod release;
pub mod service;
pub mod status;
pub mod testing;
pub mod torrent;

pub use auth::{
    create_authenticator, ApiTokenAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, ClientConfig, Config, ConfigError,
    ConfigWatcher, SanitizedConfig,
};
pub use download_client::{
    ClientConnector, ClientPool, DownloadClient, DownloadClientError, QBittorrentConnector,
};
pub use episodes::{EpisodeCountError, EpisodeCounter, TvMazeClient};
pub use hardlink::{HardlinkError, LinkOutcome};
pub use listing::{ClientEntry, ListingCache, ListingSnapshot};
pub use matching::{PendingMatch, PendingMatchSet, PendingMatchStore};
pub use release::{FuzzyMatching, Release};
pub use service::{Failure, SeasonPackService};
pub use status::{Status, StatusLevel};
