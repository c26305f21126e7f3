//! Episode-count lookup used by smart mode.

mod tvmaze;

pub use tvmaze::TvMazeClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from an episode-count lookup.
#[derive(Debug, Error)]
pub enum EpisodeCountError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Show not found (404).
    #[error("Show not found: {0}")]
    ShowNotFound(String),

    /// The show exists but the season has no episodes.
    #[error("couldn't find episodes in season {season} of {title:?}")]
    NoEpisodes { title: String, season: u32 },

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Source of the total number of episodes in a season.
#[async_trait]
pub trait EpisodeCounter: Send + Sync {
    /// Total episodes of `season` of the show called `title`. Never zero.
    async fn episodes_in_season(&self, title: &str, season: u32)
        -> Result<u32, EpisodeCountError>;
}
