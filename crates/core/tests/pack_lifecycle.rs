//! Season-pack lifecycle integration tests.
//!
//! These tests drive the service with a mock download client and episode
//! counter against real temp directories:
//! - Pack phase outcomes (hardlinks, already in client, not a season pack)
//! - Smart mode threshold
//! - Deferred linking through the parse phase
//! - Listing cache behaviour under concurrent announces

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::watch;

use packlink_core::{
    download_client::{ClientConnector, DownloadClientError},
    testing::{
        fixtures::{config, episode_name, pack_torrent},
        MockConnector, MockDownloadClient, MockEpisodeCounter,
    },
    Config, SeasonPackService, Status,
};

const PACK: &str = "Series.S01.1080p.WEB-DL.H.264-RlsGrp";
const TAIL: &str = "1080p.WEB-DL.H.264-RlsGrp";

/// Test helper holding the service and its collaborators.
struct TestHarness {
    service: Arc<SeasonPackService>,
    client: MockDownloadClient,
    connector: Arc<MockConnector>,
    episodes: MockEpisodeCounter,
    downloads: TempDir,
    pre_import: TempDir,
    _config_tx: watch::Sender<Arc<Config>>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let downloads = TempDir::new().expect("Failed to create downloads dir");
        let pre_import = TempDir::new().expect("Failed to create pre-import dir");

        let mut cfg = config(pre_import.path());
        adjust(&mut cfg);
        let (config_tx, config_rx) = watch::channel(Arc::new(cfg));

        let client = MockDownloadClient::new();
        let connector = Arc::new(MockConnector::new(client.clone()));
        let episodes = MockEpisodeCounter::new();

        let service = SeasonPackService::new(
            config_rx,
            Arc::clone(&connector) as Arc<dyn ClientConnector>,
            Arc::new(episodes.clone()),
        );

        Self {
            service: Arc::new(service),
            client,
            connector,
            episodes,
            downloads,
            pre_import,
            _config_tx: config_tx,
        }
    }

    fn save_path(&self) -> String {
        self.downloads.path().to_string_lossy().into_owned()
    }

    /// Add a single-episode torrent and write its file to disk.
    async fn add_episode(&self, episode: u32, tail: &str) -> String {
        let name = episode_name("Series", 1, episode, tail);
        let path = self.downloads.path().join(format!("{}.mkv", name));
        tokio::fs::write(&path, format!("episode {}", episode))
            .await
            .unwrap();
        self.client
            .add_torrent(&name, &self.save_path(), episode_size(episode))
            .await;
        name
    }

    async fn add_season(&self, episodes: u32) {
        for episode in 1..=episodes {
            self.add_episode(episode, TAIL).await;
        }
    }

    fn pack_dir(&self, name: &str) -> PathBuf {
        self.pre_import.path().join(name)
    }

    async fn pack(&self, name: &str) -> Result<Status, u16> {
        self.service
            .process_pack(name, "")
            .await
            .map_err(|f| f.code())
    }

    async fn parse(&self, name: &str, torrent: &Value) -> Result<Status, u16> {
        self.service
            .process_parse(name, "", torrent)
            .await
            .map_err(|f| f.code())
    }
}

fn episode_size(episode: u32) -> u64 {
    1_000_000 + u64::from(episode)
}

fn linked_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn encoded(bytes: &[u8]) -> Value {
    json!(STANDARD.encode(bytes))
}

// =============================================================================
// Pack phase
// =============================================================================

#[tokio::test]
async fn test_pack_hardlinks_all_episodes() {
    let harness = TestHarness::new();
    harness.add_season(8).await;

    let result = harness.pack(PACK).await;
    assert_eq!(result, Ok(Status::SuccessfulHardlink));

    let linked = linked_files(&harness.pack_dir(PACK));
    assert_eq!(linked.len(), 8);
    assert_eq!(linked[0], format!("{}.mkv", episode_name("Series", 1, 1, TAIL)));

    let content = tokio::fs::read_to_string(harness.pack_dir(PACK).join(&linked[7]))
        .await
        .unwrap();
    assert_eq!(content, "episode 8");
}

#[tokio::test]
async fn test_pack_is_idempotent() {
    let harness = TestHarness::new();
    harness.add_season(3).await;

    assert_eq!(harness.pack(PACK).await, Ok(Status::SuccessfulHardlink));
    assert_eq!(harness.pack(PACK).await, Ok(Status::SuccessfulHardlink));
    assert_eq!(linked_files(&harness.pack_dir(PACK)).len(), 3);
}

#[tokio::test]
async fn test_pack_already_in_client() {
    let harness = TestHarness::new();
    harness.add_season(8).await;
    harness
        .client
        .add_torrent(PACK, &harness.save_path(), 8_000_000)
        .await;

    assert_eq!(harness.pack(PACK).await, Err(210));
    assert!(!harness.pack_dir(PACK).exists());
}

#[tokio::test]
async fn test_pack_rejects_single_episode_announce() {
    let harness = TestHarness::new();
    harness.add_season(8).await;

    let announce = format!("{}.mkv", episode_name("Series", 1, 1, TAIL));
    assert_eq!(harness.pack(&announce).await, Err(211));

    let empty = TestHarness::new();
    assert_eq!(empty.pack(&announce).await, Err(211));
}

#[tokio::test]
async fn test_pack_no_matches() {
    let harness = TestHarness::new();
    harness.add_season(2).await;

    assert_eq!(harness.pack("Other.Show.S01.1080p.WEB-DL.H.264-RlsGrp").await, Err(200));
}

#[tokio::test]
async fn test_pack_only_mismatching_candidates() {
    let harness = TestHarness::new();
    harness.add_episode(1, "720p.WEB-DL.H.264-RlsGrp").await;
    harness.add_episode(2, "1080p.WEB-DL.H.264-OtherGrp").await;

    assert_eq!(harness.pack(PACK).await, Err(200));
    assert!(harness.service.pending().get(PACK).is_none());
}

#[tokio::test]
async fn test_pack_links_only_matching_quality() {
    let harness = TestHarness::new();
    harness.add_episode(1, TAIL).await;
    harness.add_episode(2, TAIL).await;
    harness.add_episode(3, "2160p.WEB-DL.H.265-RlsGrp").await;

    assert_eq!(harness.pack(PACK).await, Ok(Status::SuccessfulHardlink));
    assert_eq!(linked_files(&harness.pack_dir(PACK)).len(), 2);
}

#[tokio::test]
async fn test_pack_partial_hardlink_failure_still_succeeds() {
    let harness = TestHarness::new();
    harness.add_season(3).await;
    // Listed by the client but missing on disk
    harness
        .client
        .add_torrent(
            &episode_name("Series", 1, 4, TAIL),
            &harness.save_path(),
            episode_size(4),
        )
        .await;

    assert_eq!(harness.pack(PACK).await, Ok(Status::SuccessfulHardlink));
    assert_eq!(linked_files(&harness.pack_dir(PACK)).len(), 3);
}

#[tokio::test]
async fn test_pack_all_hardlinks_fail() {
    let harness = TestHarness::new();
    for episode in 1..=2 {
        harness
            .client
            .add_torrent(
                &episode_name("Series", 1, episode, TAIL),
                "/nonexistent/downloads",
                episode_size(episode),
            )
            .await;
    }

    assert_eq!(harness.pack(PACK).await, Err(440));
}

#[tokio::test]
async fn test_pack_skips_candidates_without_files() {
    let harness = TestHarness::new();
    harness.add_episode(1, TAIL).await;
    let name = episode_name("Series", 1, 2, TAIL);
    let hash = harness
        .client
        .add_torrent(&name, &harness.save_path(), episode_size(2))
        .await;
    harness.client.fail_files_for(&hash).await;

    assert_eq!(harness.pack(PACK).await, Ok(Status::SuccessfulHardlink));
    assert_eq!(harness.service.pending().get(PACK).unwrap().len(), 1);
}

#[tokio::test]
async fn test_pack_request_errors() {
    let harness = TestHarness::new();
    harness.add_season(2).await;

    let missing = harness.service.process_pack(PACK, "missing").await;
    assert_eq!(missing.unwrap_err().status, Status::ClientNotFound);

    let no_name = harness.service.process_pack("", "default").await;
    assert_eq!(no_name.unwrap_err().status, Status::AnnounceNameError);
}

#[tokio::test]
async fn test_pack_listing_error_is_retried() {
    let harness = TestHarness::new();
    harness.add_season(2).await;
    harness
        .client
        .set_next_error(DownloadClientError::Timeout)
        .await;

    let failure = harness.service.process_pack(PACK, "").await.unwrap_err();
    assert_eq!(failure.status, Status::GetTorrentsError);
    assert_eq!(
        failure.message,
        "could not get torrents from client: Request timeout"
    );

    assert_eq!(harness.pack(PACK).await, Ok(Status::SuccessfulHardlink));
    assert_eq!(harness.client.list_calls().await, 2);
}

#[tokio::test]
async fn test_pack_login_error_is_retried() {
    let harness = TestHarness::new();
    harness.add_season(2).await;
    harness
        .connector
        .set_next_error(DownloadClientError::AuthenticationFailed(
            "Invalid username or password".to_string(),
        ))
        .await;

    assert_eq!(harness.pack(PACK).await, Err(471));
    assert_eq!(harness.pack(PACK).await, Ok(Status::SuccessfulHardlink));
    assert_eq!(harness.connector.connect_count().await, 2);

    // Logged in once, reused afterwards
    harness.pack(PACK).await.unwrap();
    assert_eq!(harness.connector.connect_count().await, 2);
}

#[tokio::test]
async fn test_pack_title_with_path_is_rejected() {
    let harness = TestHarness::new();
    harness.add_season(2).await;

    // Names of this group skip character stripping
    let name = "../../Series.S01.1080p.WEB-DL.H.264-ZR";

    assert_eq!(harness.pack(name).await, Err(469));
    assert_eq!(harness.client.list_calls().await, 0);
    let outside = harness.pre_import.path().parent().unwrap().parent().unwrap();
    assert!(!outside.join("Series.S01.1080p.WEB-DL.H.264-ZR").exists());
}

// =============================================================================
// Smart mode
// =============================================================================

#[tokio::test]
async fn test_smart_mode_below_threshold_discards_matches() {
    let harness = TestHarness::with_config(|c| {
        c.smart_mode.enabled = true;
        c.smart_mode.threshold = 0.75;
    });
    harness.add_season(6).await;
    harness.episodes.set_total("Series", 1, 10).await;

    let failure = harness.service.process_pack(PACK, "").await.unwrap_err();
    assert_eq!(failure.status, Status::BelowThreshold);
    assert!(failure.message.contains("found 6/10 (60.00%)"));

    assert!(harness.service.pending().get(PACK).is_none());
    assert!(!harness.pack_dir(PACK).exists());

    let torrent = pack_torrent(PACK, &[(&["Series.S01E01.1080p.WEB-DL.H.264-RlsGrp.mkv"], episode_size(1))]);
    assert_eq!(harness.parse(PACK, &encoded(&torrent)).await, Err(200));
}

#[tokio::test]
async fn test_smart_mode_above_threshold_links() {
    let harness = TestHarness::with_config(|c| {
        c.smart_mode.enabled = true;
        c.smart_mode.threshold = 0.75;
    });
    harness.add_season(8).await;
    harness.episodes.set_total("Series", 1, 10).await;

    assert_eq!(harness.pack(PACK).await, Ok(Status::SuccessfulHardlink));
    assert_eq!(
        harness.episodes.lookups().await,
        vec![("Series".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_smart_mode_lookup_failure() {
    let harness = TestHarness::with_config(|c| c.smart_mode.enabled = true);
    harness.add_season(2).await;

    assert_eq!(harness.pack(PACK).await, Err(450));
}

// =============================================================================
// Parse phase
// =============================================================================

fn deferred() -> TestHarness {
    TestHarness::with_config(|c| c.pack.parse_torrent_file = true)
}

#[tokio::test]
async fn test_deferred_pack_then_parse_uses_pack_file_names() {
    let harness = deferred();
    harness.add_season(3).await;

    assert_eq!(harness.pack(PACK).await, Ok(Status::SuccessfulMatch));
    assert!(!harness.pack_dir(PACK).exists());
    assert_eq!(harness.service.pending().get(PACK).unwrap().len(), 3);

    let torrent = pack_torrent(
        PACK,
        &[
            (&["series.s01e03.1080p.web-dl.h264-rlsgrp.mkv"], episode_size(3)),
            (&["series.s01e01.1080p.web-dl.h264-rlsgrp.mkv"], episode_size(1)),
            (&["series.s01e02.1080p.web-dl.h264-rlsgrp.mkv"], episode_size(2)),
            (&["series.s01.nfo"], 100),
        ],
    );

    assert_eq!(
        harness.parse(PACK, &encoded(&torrent)).await,
        Ok(Status::SuccessfulHardlink)
    );
    assert_eq!(
        linked_files(&harness.pack_dir(PACK)),
        vec![
            "series.s01e01.1080p.web-dl.h264-rlsgrp.mkv",
            "series.s01e02.1080p.web-dl.h264-rlsgrp.mkv",
            "series.s01e03.1080p.web-dl.h264-rlsgrp.mkv",
        ]
    );

    // Retried parse calls find the links already in place
    assert_eq!(
        harness.parse(PACK, &encoded(&torrent)).await,
        Ok(Status::SuccessfulHardlink)
    );
}

#[tokio::test]
async fn test_parse_accepts_byte_array_payload() {
    let harness = deferred();
    harness.add_season(1).await;
    harness.pack(PACK).await.unwrap();

    let torrent = pack_torrent(
        PACK,
        &[(&["Sub", "Series.S01E01.1080p.WEB-DL.H.264-RlsGrp.mkv"], episode_size(1))],
    );
    let payload = Value::Array(torrent.iter().map(|b| json!(b)).collect());

    assert_eq!(
        harness.parse(PACK, &payload).await,
        Ok(Status::SuccessfulHardlink)
    );
    assert!(harness
        .pack_dir(PACK)
        .join("Sub/Series.S01E01.1080p.WEB-DL.H.264-RlsGrp.mkv")
        .exists());
}

#[tokio::test]
async fn test_parse_without_correlation() {
    let harness = deferred();
    harness.add_season(2).await;
    harness.pack(PACK).await.unwrap();

    let torrent = pack_torrent(
        PACK,
        &[
            (&["Series.S01E01.1080p.WEB-DL.H.264-RlsGrp.mkv"], 1),
            (&["Series.S01E02.1080p.WEB-DL.H.264-RlsGrp.mkv"], 2),
        ],
    );
    assert_eq!(harness.parse(PACK, &encoded(&torrent)).await, Err(445));
}

#[tokio::test]
async fn test_parse_request_errors() {
    let harness = deferred();
    harness.add_season(1).await;
    harness.pack(PACK).await.unwrap();

    let valid = encoded(&pack_torrent(PACK, &[(&["a.mkv"], 1)]));

    let missing = harness.service.process_parse(PACK, "missing", &valid).await;
    assert_eq!(missing.unwrap_err().code(), 472);
    assert_eq!(harness.parse("", &valid).await, Err(469));
    assert_eq!(harness.parse(PACK, &Value::Null).await, Err(467));
    assert_eq!(harness.parse(PACK, &json!("")).await, Err(467));
    assert_eq!(harness.parse(PACK, &json!("%%%")).await, Err(466));
    assert_eq!(harness.parse(PACK, &encoded(b"garbage")).await, Err(465));

    let no_episodes = pack_torrent(PACK, &[(&["readme.txt"], 1)]);
    assert_eq!(harness.parse(PACK, &encoded(&no_episodes)).await, Err(464));
}

#[tokio::test]
async fn test_parse_never_links_outside_pack_dir() {
    let harness = deferred();
    harness.add_season(1).await;
    harness.pack(PACK).await.unwrap();

    let escaping = "escaped.S01E01.1080p.WEB-DL.H.264-RlsGrp.mkv";
    let torrent = pack_torrent(PACK, &[(&["..", "..", escaping], episode_size(1))]);

    assert_eq!(harness.parse(PACK, &encoded(&torrent)).await, Err(464));
    let outside = harness.pre_import.path().parent().unwrap();
    assert!(!outside.join(escaping).exists());
    assert!(!harness.pack_dir(PACK).exists());
}

#[tokio::test]
async fn test_parse_links_safe_files_next_to_unsafe_ones() {
    let harness = deferred();
    harness.add_season(2).await;
    harness.pack(PACK).await.unwrap();

    let torrent = pack_torrent(
        PACK,
        &[
            (&["..", "series.s01e01.1080p.web-dl.h264-rlsgrp.mkv"], episode_size(1)),
            (&["series.s01e02.1080p.web-dl.h264-rlsgrp.mkv"], episode_size(2)),
        ],
    );

    assert_eq!(
        harness.parse(PACK, &encoded(&torrent)).await,
        Ok(Status::SuccessfulHardlink)
    );
    assert_eq!(
        linked_files(&harness.pack_dir(PACK)),
        vec!["series.s01e02.1080p.web-dl.h264-rlsgrp.mkv"]
    );
    assert!(!harness
        .pre_import
        .path()
        .join("series.s01e01.1080p.web-dl.h264-rlsgrp.mkv")
        .exists());
}

#[tokio::test]
async fn test_parse_rejects_torrent_name_with_path() {
    let harness = deferred();
    harness.add_season(1).await;
    harness.pack(PACK).await.unwrap();

    let torrent = pack_torrent(
        "../Series.S01",
        &[(&["Series.S01E01.1080p.WEB-DL.H.264-RlsGrp.mkv"], episode_size(1))],
    );

    assert_eq!(harness.parse(PACK, &encoded(&torrent)).await, Err(465));
    let outside = harness.pre_import.path().parent().unwrap();
    assert!(!outside.join("Series.S01").exists());
}

#[tokio::test]
async fn test_parse_ignores_uppercase_extension() {
    let harness = deferred();
    harness.add_season(1).await;
    harness.pack(PACK).await.unwrap();

    let torrent = pack_torrent(
        PACK,
        &[(&["Series.S01E01.1080p.WEB-DL.H.264-RlsGrp.MKV"], episode_size(1))],
    );

    assert_eq!(harness.parse(PACK, &encoded(&torrent)).await, Err(464));
}

#[tokio::test]
async fn test_parse_without_pending_matches() {
    let harness = deferred();
    let torrent = pack_torrent(PACK, &[(&["Series.S01E01.1080p.WEB-DL.H.264-RlsGrp.mkv"], 1)]);

    assert_eq!(harness.parse(PACK, &encoded(&torrent)).await, Err(200));
}

#[tokio::test]
async fn test_repeated_pack_replaces_pending_matches() {
    let harness = deferred();
    harness.add_season(2).await;

    harness.pack(PACK).await.unwrap();
    harness.pack(PACK).await.unwrap();

    assert_eq!(harness.service.pending().get(PACK).unwrap().len(), 2);
    assert_eq!(harness.service.pending().len(), 1);
}

// =============================================================================
// Listing cache
// =============================================================================

#[tokio::test]
async fn test_concurrent_announces_fetch_listing_once() {
    let harness = deferred();
    harness.add_season(4).await;
    harness
        .client
        .set_latency(Duration::from_millis(200))
        .await;

    let results = futures::future::join_all((0..8).map(|_| harness.pack(PACK))).await;

    assert!(results.iter().all(|r| *r == Ok(Status::SuccessfulMatch)));
    assert_eq!(harness.client.list_calls().await, 1);
    assert_eq!(harness.connector.connect_count().await, 1);
}

#[tokio::test]
async fn test_fresh_listing_is_reused() {
    let harness = deferred();
    harness.add_season(2).await;
    harness
        .client
        .set_latency(Duration::from_millis(500))
        .await;

    harness.pack(PACK).await.unwrap();
    harness.pack(PACK).await.unwrap();

    assert_eq!(harness.client.list_calls().await, 1);
    assert_eq!(harness.service.listings().len(), 1);
}
