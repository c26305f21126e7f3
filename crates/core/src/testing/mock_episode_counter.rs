//! Mock episode counter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::episodes::{EpisodeCountError, EpisodeCounter};

/// Mock implementation of the EpisodeCounter trait.
///
/// Returns configured totals keyed by (title, season) and records lookups.
#[derive(Debug, Clone, Default)]
pub struct MockEpisodeCounter {
    totals: Arc<RwLock<HashMap<(String, u32), u32>>>,
    lookups: Arc<RwLock<Vec<(String, u32)>>>,
}

impl MockEpisodeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total episode count for a show season.
    pub async fn set_total(&self, title: &str, season: u32, total: u32) {
        self.totals
            .write()
            .await
            .insert((title.to_string(), season), total);
    }

    /// All lookups made so far.
    pub async fn lookups(&self) -> Vec<(String, u32)> {
        self.lookups.read().await.clone()
    }
}

#[async_trait]
impl EpisodeCounter for MockEpisodeCounter {
    async fn episodes_in_season(
        &self,
        title: &str,
        season: u32,
    ) -> Result<u32, EpisodeCountError> {
        self.lookups.write().await.push((title.to_string(), season));

        match self.totals.read().await.get(&(title.to_string(), season)) {
            Some(&total) if total > 0 => Ok(total),
            _ => Err(EpisodeCountError::NoEpisodes {
                title: title.to_string(),
                season,
            }),
        }
    }
}
