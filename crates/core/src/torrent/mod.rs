//! Season-pack torrent metadata.
//!
//! Turns the `torrent` field of a parse request into the pack's file
//! listing: the payload is first decoded into raw `.torrent` bytes, then the
//! bencoded metadata is read with librqbit-core.

mod parser;
mod payload;

pub use parser::{episode_files, parse_pack_listing};
pub use payload::{decode_payload, is_empty_payload};

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when decoding a season-pack torrent.
#[derive(Debug, Error)]
pub enum TorrentDecodeError {
    #[error("Invalid torrent payload: {0}")]
    InvalidPayload(String),

    #[error("Failed to parse torrent: {0}")]
    ParseError(String),

    #[error("not a directory")]
    NotADirectory,

    #[error("no .mkv files found")]
    NoEpisodeFiles,
}

/// A file inside a season pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackFile {
    /// Path relative to the torrent root, `/`-separated.
    pub path: String,
    pub size: u64,
}

/// Logical directory described by a torrent's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackListing {
    /// Root name (folder name for multi-file torrents).
    pub name: String,
    pub is_dir: bool,
    pub files: Vec<PackFile>,
}
