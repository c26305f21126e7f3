//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external collaborator
//! traits, so the season-pack service can be exercised without a real
//! download client or TVMaze.
//!
//! # Example
//!
//! ```rust,ignore
//! use packlink_core::testing::{MockConnector, MockDownloadClient, MockEpisodeCounter};
//!
//! let client = MockDownloadClient::new();
//! client.add_torrent("Series.S01E01.1080p.WEB-DL.H.264-RlsGrp", "/downloads", 1_000).await;
//!
//! let connector = MockConnector::new(client.clone());
//! let episodes = MockEpisodeCounter::new();
//! episodes.set_total("Series", 1, 8).await;
//! ```

mod mock_download_client;
mod mock_episode_counter;

pub use mock_download_client::{MockConnector, MockDownloadClient};
pub use mock_episode_counter::MockEpisodeCounter;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::HashMap;
    use std::path::Path;

    use crate::config::{ClientConfig, Config};
    use crate::torrent::{PackFile, PackListing};

    /// Client configuration pointing at a local pre-import directory.
    pub fn client_config(pre_import_path: &Path) -> ClientConfig {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
            pre_import_path: pre_import_path.to_path_buf(),
        }
    }

    /// Default configuration with a single `default` client.
    pub fn config(pre_import_path: &Path) -> Config {
        let mut clients = HashMap::new();
        clients.insert("default".to_string(), client_config(pre_import_path));
        Config {
            clients,
            ..Config::default()
        }
    }

    /// Scene-style episode name, e.g. `Series.S01E03.1080p.WEB-DL.H.264-RlsGrp`.
    pub fn episode_name(show: &str, season: u32, episode: u32, tail: &str) -> String {
        format!("{}.S{:02}E{:02}.{}", show, season, episode, tail)
    }

    /// A multi-file pack listing whose files are `<dir>/<file>` pairs.
    pub fn pack_listing(name: &str, files: &[(&str, u64)]) -> PackListing {
        PackListing {
            name: name.to_string(),
            is_dir: true,
            files: files
                .iter()
                .map(|(path, size)| PackFile {
                    path: path.to_string(),
                    size: *size,
                })
                .collect(),
        }
    }

    /// Bencoded multi-file `.torrent` with the given root name and files.
    ///
    /// Each file is `(path components, length)`.
    pub fn pack_torrent(name: &str, files: &[(&[&str], u64)]) -> Vec<u8> {
        let mut info = Vec::new();
        info.extend(bencode_str(b"files"));
        info.push(b'l');
        for (path, length) in files {
            info.push(b'd');
            info.extend(bencode_str(b"length"));
            info.extend(format!("i{}e", length).into_bytes());
            info.extend(bencode_str(b"path"));
            info.push(b'l');
            for part in *path {
                info.extend(bencode_str(part.as_bytes()));
            }
            info.extend(b"ee");
        }
        info.push(b'e');
        info.extend(bencode_str(b"name"));
        info.extend(bencode_str(name.as_bytes()));
        info.extend(bencode_str(b"piece length"));
        info.extend(b"i262144e");
        info.extend(bencode_str(b"pieces"));
        info.extend(bencode_str(&[0u8; 20]));

        let mut out = b"d".to_vec();
        out.extend(bencode_str(b"announce"));
        out.extend(bencode_str(b"http://tracker.invalid/announce"));
        out.extend(bencode_str(b"info"));
        out.push(b'd');
        out.extend(info);
        out.extend(b"ee");
        out
    }

    fn bencode_str(s: &[u8]) -> Vec<u8> {
        let mut out = format!("{}:", s.len()).into_bytes();
        out.extend_from_slice(s);
        out
    }
}
