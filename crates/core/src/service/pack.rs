//! Pack phase: match an announced season pack against the client.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::download_client::{ClientFile, ClientKey, ClientTorrent, DownloadClient, DownloadClientError};
use crate::hardlink::is_plain_component;
use crate::matching::PendingMatch;
use crate::metrics::observe_external_call;
use crate::release::{compare, format_pack_title, is_season_pack, parse, CompareOutcome, MismatchKind};
use crate::status::Status;

use super::{client_name_or_default, record, Failure, SeasonPackService};

impl SeasonPackService {
    /// Process a season-pack announce.
    ///
    /// Returns `SuccessfulHardlink` when at least one episode was linked, or
    /// `SuccessfulMatch` when linking is deferred to the parse phase. Every
    /// other outcome is a `Failure` carrying its status.
    pub async fn process_pack(&self, name: &str, client_name: &str) -> Result<Status, Failure> {
        let started = Instant::now();
        let client_name = client_name_or_default(client_name);
        let config = self.snapshot();

        let result = self
            .pack(&config, name, client_name)
            .instrument(info_span!("pack", release = %name, client = %client_name))
            .await;

        match &result {
            Ok(status) => info!(status = status.code(), "{}", status),
            Err(failure) => info!(status = failure.code(), "{}", failure),
        }
        record("pack", &result, started);
        result
    }

    async fn pack(&self, config: &Config, name: &str, client_name: &str) -> Result<Status, Failure> {
        let client_config = config
            .clients
            .get(client_name)
            .ok_or(Status::ClientNotFound)?;
        info!(
            "Using {} client serving at {}:{}",
            client_name, client_config.host, client_config.port
        );

        if name.is_empty() {
            return Err(Status::AnnounceNameError.into());
        }

        let pack_title = format_pack_title(name);
        if !is_plain_component(&pack_title) {
            return Err(Failure::with_cause(
                Status::AnnounceNameError,
                format!("pack title is not a plain path component: {:?}", pack_title),
            ));
        }

        let client = self
            .clients
            .get(client_config)
            .await
            .map_err(|e| Failure::with_cause(Status::GetClientError, e))?;
        let client: &dyn DownloadClient = client.as_ref();

        let key = ClientKey::from(client_config);
        let listing = self
            .listings
            .get_listing(&key, move || fetch_torrents(client))
            .await
            .map_err(|e| Failure::with_cause(Status::GetTorrentsError, e))?;

        let announced = parse(name);
        if !is_season_pack(&announced) {
            return Err(Status::NotASeasonPack.into());
        }

        let candidates = listing.bucket(&announced.title_key());
        if candidates.is_empty() {
            return Err(Status::NoMatches.into());
        }

        debug!("Formatted season pack name: {}", pack_title);

        // A pack already present must not produce partial hardlinks
        for entry in candidates {
            match compare(&announced, &entry.release, &config.fuzzy_matching) {
                CompareOutcome::AlreadyInClient => return Err(Status::AlreadyInClient.into()),
                CompareOutcome::NotASeasonPack => return Err(Status::NotASeasonPack.into()),
                _ => {}
            }
        }

        let mut rejected: HashSet<MismatchKind> = HashSet::new();
        let mut episodes: HashSet<u32> = HashSet::new();
        let mut matches: Vec<PendingMatch> = Vec::with_capacity(candidates.len());

        for entry in candidates {
            match compare(&announced, &entry.release, &config.fuzzy_matching) {
                CompareOutcome::AlreadyInClient => return Err(Status::AlreadyInClient.into()),
                CompareOutcome::NotASeasonPack => return Err(Status::NotASeasonPack.into()),
                CompareOutcome::Mismatch(mismatch) => {
                    if rejected.insert(mismatch.kind) {
                        info!(
                            status = Status::from(mismatch.kind).code(),
                            "{}: request({} => {:?}), client({} => {:?})",
                            Status::from(mismatch.kind),
                            announced,
                            mismatch.announced,
                            entry.release,
                            mismatch.candidate
                        );
                    }
                }
                CompareOutcome::SuccessfulMatch => {
                    let files = match client.list_files(&entry.torrent.hash).await {
                        Ok(files) => files,
                        Err(e) => {
                            error!(error = %e, "Failed to get files of {}", entry.torrent.name);
                            continue;
                        }
                    };

                    let Some(file) = episode_file(&files) else {
                        warn!("No episode file found in {}", entry.torrent.name);
                        continue;
                    };

                    let Some(file_name) = Path::new(&file.name).file_name() else {
                        warn!("Episode file of {} has no file name", entry.torrent.name);
                        continue;
                    };

                    episodes.insert(entry.release.episode);
                    matches.push(PendingMatch {
                        client_path: Path::new(&entry.torrent.save_path).join(&file.name),
                        client_size: file.size,
                        announced_path: client_config.pre_import_path.join(&pack_title).join(file_name),
                    });

                    debug!(
                        "Matched torrent from client: name({}), size({}), hash({})",
                        entry.torrent.name, file.size, entry.torrent.hash
                    );
                }
            }
        }

        if matches.is_empty() {
            return Err(Status::NoMatches.into());
        }

        let mut seen = HashSet::new();
        matches.retain(|m| seen.insert(m.clone()));
        self.pending.replace(name, matches.clone());

        if config.smart_mode.enabled {
            let lookup_started = Instant::now();
            let total = self
                .episodes
                .episodes_in_season(&announced.title, announced.series)
                .await;
            observe_external_call(
                "episodes",
                "episodes_in_season",
                lookup_started.elapsed().as_secs_f64(),
                total.is_ok(),
            );
            let total = total.map_err(|e| Failure::with_cause(Status::EpisodeCountError, e))?;

            let found = episodes.len() as u32;
            let ratio = episode_ratio(found, total);

            if ratio < config.smart_mode.threshold {
                self.pending.remove(name);
                return Err(Failure::with_cause(
                    Status::BelowThreshold,
                    format!(
                        "found {}/{} ({:.2}%) episodes in client",
                        found,
                        total,
                        ratio * 100.0
                    ),
                ));
            }
        }

        if config.pack.parse_torrent_file {
            info!(
                "Recorded {} matching episodes, waiting for the torrent file",
                matches.len()
            );
            return Ok(Status::SuccessfulMatch);
        }

        let mut linked = false;
        for pending in &matches {
            if self
                .link_episode(&pending.client_path, &pending.announced_path)
                .await
            {
                linked = true;
            }
        }

        if linked {
            Ok(Status::SuccessfulHardlink)
        } else {
            Err(Status::FailedHardlink.into())
        }
    }
}

async fn fetch_torrents(
    client: &dyn DownloadClient,
) -> Result<Vec<ClientTorrent>, DownloadClientError> {
    let started = Instant::now();
    let result = client.list_torrents().await;
    observe_external_call(
        client.name(),
        "list_torrents",
        started.elapsed().as_secs_f64(),
        result.is_ok(),
    );
    result
}

/// First `.mkv` file of a client torrent, if it has content.
fn episode_file(files: &[ClientFile]) -> Option<&ClientFile> {
    files
        .iter()
        .find(|f| {
            Path::new(&f.name)
                .extension()
                .is_some_and(|ext| ext == "mkv")
        })
        .filter(|f| f.size > 0)
}

fn episode_ratio(found: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(found) / f64::from(total)
    }
}
