//! Download client abstraction.
//!
//! This module provides a read-only `DownloadClient` trait (list torrents,
//! list files of a torrent), the qBittorrent implementation and a pool of
//! authenticated handles.

mod pool;
mod qbittorrent;
mod types;

pub use pool::ClientPool;
pub use qbittorrent::{QBittorrentClient, QBittorrentConnector};
pub use types::*;
