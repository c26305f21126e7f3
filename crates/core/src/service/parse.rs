//! Parse phase: link recorded episodes under the pack's real file names.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::Config;
use crate::matching::correlate_episode;
use crate::status::Status;
use crate::torrent::{decode_payload, episode_files, is_empty_payload, parse_pack_listing};

use super::{client_name_or_default, record, Failure, SeasonPackService};

impl SeasonPackService {
    /// Process the torrent file of a previously announced season pack.
    ///
    /// `torrent` is the raw request field: a base64 string or an array of
    /// byte values.
    pub async fn process_parse(
        &self,
        name: &str,
        client_name: &str,
        torrent: &Value,
    ) -> Result<Status, Failure> {
        let started = Instant::now();
        let client_name = client_name_or_default(client_name);
        let config = self.snapshot();

        let result = self
            .parse(&config, name, client_name, torrent)
            .instrument(info_span!("parse", release = %name, client = %client_name))
            .await;

        match &result {
            Ok(status) => info!(status = status.code(), "{}", status),
            Err(failure) => info!(status = failure.code(), "{}", failure),
        }
        record("parse", &result, started);
        result
    }

    async fn parse(
        &self,
        config: &Config,
        name: &str,
        client_name: &str,
        torrent: &Value,
    ) -> Result<Status, Failure> {
        let client_config = config
            .clients
            .get(client_name)
            .ok_or(Status::ClientNotFound)?;

        if name.is_empty() {
            return Err(Status::AnnounceNameError.into());
        }

        if is_empty_payload(torrent) {
            return Err(Status::TorrentBytesError.into());
        }

        let bytes = decode_payload(torrent)
            .map_err(|e| Failure::with_cause(Status::DecodeTorrentBytesError, e))?;

        let listing = parse_pack_listing(&bytes)
            .map_err(|e| Failure::with_cause(Status::ParseTorrentInfoError, e))?;
        debug!("Parsed season pack name: {}", listing.name);

        let pack_episodes = episode_files(&listing)
            .map_err(|e| Failure::with_cause(Status::GetEpisodesError, e))?;
        for episode in &pack_episodes {
            debug!(
                "Found episode in pack: name({}), size({})",
                episode.path, episode.size
            );
        }

        let Some(matches) = self.pending.get(name) else {
            return Err(Status::NoMatches.into());
        };

        let pack_dir = client_config.pre_import_path.join(&listing.name);
        let mut correlated = false;
        let mut linked = false;

        for pending in &matches {
            let client_path = pending.client_path.to_string_lossy();

            match correlate_episode(&client_path, pending.client_size, &pack_episodes) {
                Ok(file) => {
                    correlated = true;
                    let target = pack_dir.join(&file.path);
                    if self.link_episode(&pending.client_path, &target).await {
                        linked = true;
                    }
                }
                Err(e) => {
                    if let Some(mismatch) = &e.last {
                        debug!(
                            status = Status::from(mismatch.kind).code(),
                            "Last checked file did not match: {}", mismatch
                        );
                    }
                    error!(
                        "Failed to match episode to a file in the pack, skipping hardlink: {}",
                        pending
                            .client_path
                            .file_name()
                            .map(|n| n.to_string_lossy())
                            .unwrap_or_else(|| client_path.clone())
                    );
                }
            }
        }

        if !correlated {
            return Err(Status::FailedMatchToTorrentEps.into());
        }

        if !linked {
            return Err(Status::FailedHardlink.into());
        }

        Ok(Status::SuccessfulHardlink)
    }
}
