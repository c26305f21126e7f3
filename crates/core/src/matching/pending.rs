use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// A client-held episode file tentatively belonging to an announced pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PendingMatch {
    /// Absolute path of the episode file in the client.
    pub client_path: PathBuf,
    pub client_size: u64,
    /// Provisional target inside the pre-import tree.
    pub announced_path: PathBuf,
}

/// All matches recorded for one announce name.
#[derive(Debug, Clone)]
pub struct PendingMatchSet {
    pub matches: Vec<PendingMatch>,
    pub created_at: Instant,
}

/// Pending matches keyed by announce name.
///
/// Sets are replaced whole, never appended to. Entries older than the TTL
/// are treated as absent and dropped on the next access.
#[derive(Debug)]
pub struct PendingMatchStore {
    sets: Mutex<HashMap<String, PendingMatchSet>>,
    ttl: Duration,
}

impl PendingMatchStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sets: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Store the matches for `name`, replacing any previous set.
    pub fn replace(&self, name: &str, matches: Vec<PendingMatch>) {
        let mut sets = self.sets.lock().unwrap();
        self.sweep(&mut sets);
        sets.insert(
            name.to_string(),
            PendingMatchSet {
                matches,
                created_at: Instant::now(),
            },
        );
    }

    /// Matches recorded for `name`, if any and not expired.
    pub fn get(&self, name: &str) -> Option<Vec<PendingMatch>> {
        let mut sets = self.sets.lock().unwrap();
        self.sweep(&mut sets);
        sets.get(name).map(|set| set.matches.clone())
    }

    /// Drop the matches for `name`.
    pub fn remove(&self, name: &str) -> bool {
        let mut sets = self.sets.lock().unwrap();
        self.sweep(&mut sets);
        sets.remove(name).is_some()
    }

    /// Number of live sets.
    pub fn len(&self) -> usize {
        let mut sets = self.sets.lock().unwrap();
        self.sweep(&mut sets);
        sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep(&self, sets: &mut HashMap<String, PendingMatchSet>) {
        let ttl = self.ttl;
        let before = sets.len();
        sets.retain(|_, set| set.created_at.elapsed() < ttl);

        let expired = before - sets.len();
        if expired > 0 {
            tracing::debug!(expired, "Dropped expired pending matches");
        }
    }
}
