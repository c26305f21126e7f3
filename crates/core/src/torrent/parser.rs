//! Torrent file parser - extracts the file listing from .torrent bytes.
//!
//! Uses librqbit-core to parse bencoded .torrent data without needing to
//! download anything.

use std::path::Path;

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};
use tracing::warn;

use super::{PackFile, PackListing, TorrentDecodeError};
use crate::hardlink::is_plain_component;

/// Parse a .torrent file into its file listing.
///
/// Supports both single-file and multi-file torrents. File paths are
/// relative to the torrent root.
///
/// The root name must be a single plain path component. Files whose path
/// holds an empty, `.`, `..` or rooted component are left out of the listing.
pub fn parse_pack_listing(bytes: &[u8]) -> Result<PackListing, TorrentDecodeError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| TorrentDecodeError::ParseError(e.to_string()))?;

    let info = &torrent.info;

    let name = info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .unwrap_or_else(|| "unknown".to_string());

    if !is_plain_component(&name) {
        return Err(TorrentDecodeError::ParseError(format!(
            "torrent name is not a plain path component: {:?}",
            name
        )));
    }

    if let Some(ref files) = info.files {
        let files = files
            .iter()
            .filter_map(|file| {
                let parts: Vec<String> = file
                    .path
                    .iter()
                    .map(|part| bytes_to_string(part.as_ref()))
                    .collect();
                let path = parts.join("/");

                if parts.is_empty() || !parts.iter().all(|part| is_plain_component(part)) {
                    warn!("Skipping torrent file with unsafe path: {:?}", path);
                    return None;
                }

                Some(PackFile {
                    path,
                    size: file.length,
                })
            })
            .collect();

        Ok(PackListing {
            name,
            is_dir: true,
            files,
        })
    } else if let Some(length) = info.length {
        Ok(PackListing {
            files: vec![PackFile {
                path: name.clone(),
                size: length,
            }],
            name,
            is_dir: false,
        })
    } else {
        Err(TorrentDecodeError::ParseError(
            "torrent has neither files nor length".to_string(),
        ))
    }
}

/// Episode files of a season pack: `.mkv` files sorted by path.
///
/// Single-file torrents are rejected, a pack is always a directory.
pub fn episode_files(listing: &PackListing) -> Result<Vec<PackFile>, TorrentDecodeError> {
    if !listing.is_dir {
        return Err(TorrentDecodeError::NotADirectory);
    }

    let mut episodes: Vec<PackFile> = listing
        .files
        .iter()
        .filter(|file| {
            Path::new(&file.path)
                .extension()
                .is_some_and(|ext| ext == "mkv")
        })
        .cloned()
        .collect();

    if episodes.is_empty() {
        return Err(TorrentDecodeError::NoEpisodeFiles);
    }

    episodes.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(episodes)
}

/// Convert bytes to a UTF-8 string, replacing invalid sequences.
fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
