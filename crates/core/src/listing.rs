//! Per-client cache of the download client's torrent listing.
//!
//! Each client key owns a slot holding an immutable `ListingSnapshot`.
//! Readers take the current snapshot when it is still valid. Once stale, the
//! first caller refreshes it under the slot's refresh lock while the others
//! wait on the same lock and then reuse the freshly published snapshot.
//!
//! The validity window adapts to traffic: a snapshot refreshed by a call
//! that started at `t0` and finished at `t1` stays valid until
//! `t1 + (t1 - t0)`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};

use tokio::time::Instant;

use crate::download_client::{ClientKey, ClientTorrent, DownloadClientError};
use crate::metrics::LISTING_REFRESHES_TOTAL;
use crate::release::{parse, Release};

/// One torrent of the client with its parsed name.
#[derive(Debug, Clone)]
pub struct ClientEntry {
    pub torrent: ClientTorrent,
    pub release: Arc<Release>,
}

/// Immutable view of a client's torrents, bucketed by title key.
#[derive(Debug, Default)]
pub struct ListingSnapshot {
    entries: HashMap<String, Vec<ClientEntry>>,
    releases: HashMap<String, Arc<Release>>,
    valid_until: Option<Instant>,
}

impl ListingSnapshot {
    /// Build a snapshot from a fresh torrent list.
    ///
    /// Names already parsed in `previous` reuse that `Release`.
    fn build(
        torrents: Vec<ClientTorrent>,
        previous: &ListingSnapshot,
        valid_until: Instant,
    ) -> Self {
        let mut entries: HashMap<String, Vec<ClientEntry>> = HashMap::new();
        let mut releases: HashMap<String, Arc<Release>> = HashMap::with_capacity(torrents.len());

        for torrent in torrents {
            let release = match releases.get(&torrent.name) {
                Some(release) => Arc::clone(release),
                None => {
                    let release = previous
                        .releases
                        .get(&torrent.name)
                        .cloned()
                        .unwrap_or_else(|| Arc::new(parse(&torrent.name)));
                    releases.insert(torrent.name.clone(), Arc::clone(&release));
                    release
                }
            };

            entries
                .entry(release.title_key())
                .or_default()
                .push(ClientEntry { torrent, release });
        }

        Self {
            entries,
            releases,
            valid_until: Some(valid_until),
        }
    }

    /// Client entries sharing a title key, in listing order.
    pub fn bucket(&self, title_key: &str) -> &[ClientEntry] {
        self.entries
            .get(title_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Memoized parse of a torrent name.
    pub fn release(&self, name: &str) -> Option<&Arc<Release>> {
        self.releases.get(name)
    }

    /// Number of distinct torrent names in the snapshot.
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn valid_until(&self) -> Option<Instant> {
        self.valid_until
    }

    fn is_valid_at(&self, at: Instant) -> bool {
        self.valid_until.is_some_and(|until| until > at)
    }
}

#[derive(Debug, Default)]
struct Slot {
    current: RwLock<Arc<ListingSnapshot>>,
    refresh: tokio::sync::Mutex<()>,
}

impl Slot {
    fn snapshot(&self) -> Arc<ListingSnapshot> {
        Arc::clone(&self.current.read().unwrap())
    }
}

/// Listing cache shared by every request of a service instance.
#[derive(Debug, Default)]
pub struct ListingCache {
    slots: Mutex<HashMap<ClientKey, Arc<Slot>>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the listing for `key`, refreshing it through `fetch` when stale.
    ///
    /// A failed fetch is returned to the caller and nothing is published, so
    /// the next caller fetches again.
    pub async fn get_listing<F, Fut>(
        &self,
        key: &ClientKey,
        fetch: F,
    ) -> Result<Arc<ListingSnapshot>, DownloadClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ClientTorrent>, DownloadClientError>>,
    {
        let started = Instant::now();
        let slot = self.slot(key);

        let snapshot = slot.snapshot();
        if snapshot.is_valid_at(started) {
            return Ok(snapshot);
        }

        let _guard = slot.refresh.lock().await;

        // Another caller may have refreshed while we waited
        let snapshot = slot.snapshot();
        if snapshot.is_valid_at(started) {
            return Ok(snapshot);
        }

        let torrents = match fetch().await {
            Ok(torrents) => torrents,
            Err(e) => {
                LISTING_REFRESHES_TOTAL.with_label_values(&["error"]).inc();
                tracing::warn!(host = %key.host, port = key.port, error = %e, "Failed to refresh torrent listing");
                return Err(e);
            }
        };

        let finished = Instant::now();
        let valid_until = finished + (finished - started);
        let fresh = Arc::new(ListingSnapshot::build(torrents, &snapshot, valid_until));

        *slot.current.write().unwrap() = Arc::clone(&fresh);
        LISTING_REFRESHES_TOTAL.with_label_values(&["success"]).inc();
        tracing::debug!(
            host = %key.host,
            port = key.port,
            torrents = fresh.len(),
            window_ms = (finished - started).as_millis() as u64,
            "Refreshed torrent listing"
        );

        Ok(fresh)
    }

    /// Number of client keys with a slot.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &ClientKey) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap();
        Arc::clone(slots.entry(key.clone()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn key(host: &str) -> ClientKey {
        ClientKey {
            host: host.to_string(),
            port: 8080,
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
        }
    }

    fn torrent(name: &str) -> ClientTorrent {
        ClientTorrent {
            hash: format!("{:040x}", name.len()),
            name: name.to_string(),
            save_path: "/downloads".to_string(),
        }
    }

    fn listing() -> Vec<ClientTorrent> {
        vec![
            torrent("Rabbit.Hole.S01E01.1080p.WEB-DL.H.264-RlsGrp"),
            torrent("Rabbit.Hole.S01E02.1080p.WEB-DL.H.264-RlsGrp"),
            torrent("Other.Show.S02E01.720p.HDTV.x264-Grp"),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_buckets_by_title_key() {
        let cache = ListingCache::new();
        let snapshot = cache
            .get_listing(&key("a"), || async { Ok(listing()) })
            .await
            .unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.bucket("rabbit hole01").len(), 2);
        assert_eq!(snapshot.bucket("other show02").len(), 1);
        assert!(snapshot.bucket("missing01").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_snapshot_skips_fetch() {
        let cache = ListingCache::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(listing())
        };

        cache.get_listing(&key("a"), fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Window is the 2s the refresh took
        tokio::time::advance(Duration::from_millis(1500)).await;
        cache.get_listing(&key("a"), fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        cache.get_listing(&key("a"), fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_fetch_once() {
        let cache = Arc::new(ListingCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_listing(&key("a"), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        Ok(listing())
                    })
                    .await
                    .unwrap()
            }));
        }

        let snapshots: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(snapshots.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_is_not_cached() {
        let cache = ListingCache::new();

        let result = cache
            .get_listing(&key("a"), || async { Err(DownloadClientError::Timeout) })
            .await;
        assert!(matches!(result, Err(DownloadClientError::Timeout)));

        let snapshot = cache
            .get_listing(&key("a"), || async { Ok(listing()) })
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let cache = ListingCache::new();

        cache
            .get_listing(&key("a"), || async { Ok(listing()) })
            .await
            .unwrap();
        let other = cache
            .get_listing(&key("b"), || async { Ok(vec![torrent("Solo.S01E01.720p-Grp")]) })
            .await
            .unwrap();

        assert_eq!(other.len(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_reuses_parsed_releases() {
        let cache = ListingCache::new();
        let first = cache
            .get_listing(&key("a"), || async { Ok(listing()) })
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        let mut next = listing();
        next.push(torrent("New.Show.S01E01.1080p.WEB-DL-Grp"));
        let second = cache
            .get_listing(&key("a"), move || async move { Ok(next) })
            .await
            .unwrap();

        let name = "Rabbit.Hole.S01E01.1080p.WEB-DL.H.264-RlsGrp";
        assert!(Arc::ptr_eq(
            first.release(name).unwrap(),
            second.release(name).unwrap()
        ));
        assert_eq!(second.len(), 4);
    }
}
