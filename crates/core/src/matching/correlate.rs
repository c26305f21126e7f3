use std::path::Path;

use thiserror::Error;

use crate::release::{normalize, parse, FieldMismatch, MismatchKind};
use crate::torrent::PackFile;

/// No entry of the pack listing matched a client episode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no matching episode in torrent{}", .last.as_ref().map(|m| format!(" ({})", m)).unwrap_or_default())]
pub struct CorrelationError {
    /// Mismatch of the last compared entry, `None` for an empty listing.
    pub last: Option<FieldMismatch>,
}

/// Check whether a pack file is the same episode as a client file.
///
/// Size is compared first, then season, episode, resolution and group, all
/// parsed from the file basenames.
pub fn match_episode_file(
    client_path: &str,
    client_size: u64,
    file: &PackFile,
) -> Result<(), FieldMismatch> {
    if client_size != file.size {
        return Err(FieldMismatch::new(MismatchKind::Size, client_size, file.size));
    }

    let client = parse(basename(client_path));
    let candidate = parse(basename(&file.path));

    if client.series != candidate.series {
        return Err(FieldMismatch::new(
            MismatchKind::Season,
            client.series,
            candidate.series,
        ));
    }
    if client.episode != candidate.episode {
        return Err(FieldMismatch::new(
            MismatchKind::Episode,
            client.episode,
            candidate.episode,
        ));
    }
    if normalize(&client.resolution) != normalize(&candidate.resolution) {
        return Err(FieldMismatch::new(
            MismatchKind::Resolution,
            client.resolution,
            candidate.resolution,
        ));
    }
    if normalize(&client.group) != normalize(&candidate.group) {
        return Err(FieldMismatch::new(
            MismatchKind::Group,
            client.group,
            candidate.group,
        ));
    }

    Ok(())
}

/// Find the pack file holding the same episode as a client file.
///
/// The first satisfying entry wins.
pub fn correlate_episode<'a>(
    client_path: &str,
    client_size: u64,
    files: &'a [PackFile],
) -> Result<&'a PackFile, CorrelationError> {
    let mut last = None;

    for file in files {
        match match_episode_file(client_path, client_size, file) {
            Ok(()) => return Ok(file),
            Err(mismatch) => last = Some(mismatch),
        }
    }

    Err(CorrelationError { last })
}

fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}
