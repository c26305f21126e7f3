//! TVMaze API client.
//!
//! TVMaze is a free API that doesn't require authentication.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::TvMazeConfig;

use super::{EpisodeCountError, EpisodeCounter};

/// TVMaze API client.
pub struct TvMazeClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TvMazeShow {
    name: String,
    #[serde(rename = "_embedded", default)]
    embedded: Option<TvMazeEmbedded>,
}

#[derive(Debug, Deserialize)]
struct TvMazeEmbedded {
    #[serde(default)]
    episodes: Vec<TvMazeEpisode>,
}

#[derive(Debug, Deserialize)]
struct TvMazeEpisode {
    season: u32,
}

impl TvMazeClient {
    pub fn new(config: &TvMazeConfig) -> Result<Self, EpisodeCountError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EpisodeCounter for TvMazeClient {
    async fn episodes_in_season(
        &self,
        title: &str,
        season: u32,
    ) -> Result<u32, EpisodeCountError> {
        let url = format!("{}/singlesearch/shows", self.base_url);

        debug!("TVMaze show lookup: title='{}', season={}", title, season);

        let response = self
            .client
            .get(&url)
            .query(&[("q", title), ("embed", "episodes")])
            .send()
            .await?;

        let status = response.status();
        if status == 404 {
            return Err(EpisodeCountError::ShowNotFound(title.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EpisodeCountError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let show: TvMazeShow = response.json().await.map_err(|e| {
            EpisodeCountError::ParseError(format!("Failed to parse show response: {}", e))
        })?;

        count_season(&show, title, season)
    }
}

fn count_season(show: &TvMazeShow, title: &str, season: u32) -> Result<u32, EpisodeCountError> {
    let total = show
        .embedded
        .as_ref()
        .map(|e| e.episodes.iter().filter(|ep| ep.season == season).count())
        .unwrap_or(0) as u32;

    debug!(show = %show.name, season, total, "TVMaze episode count");

    if total == 0 {
        return Err(EpisodeCountError::NoEpisodes {
            title: title.to_string(),
            season,
        });
    }

    Ok(total)
}
