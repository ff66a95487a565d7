use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use uuid::Uuid;

use crate::state::standings::{StandingRow, TopPlayers};

/// Computed standings of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsSnapshot {
    /// Session the snapshot belongs to.
    pub session_id: Uuid,
    /// Sorted table rows.
    pub table: Vec<StandingRow>,
    /// Leaderboards.
    pub top_players: TopPlayers,
    /// When the snapshot was computed.
    pub computed_at: SystemTime,
}

/// Cache of standings snapshots. Entries are replaced wholesale, never patched.
pub trait StandingsCache: Send + Sync {
    /// Snapshot of a session, if cached.
    fn get(&self, session_id: Uuid) -> Option<Arc<StandingsSnapshot>>;
    /// Store `snapshot`, replacing any previous one for its session.
    fn put(&self, snapshot: StandingsSnapshot) -> Arc<StandingsSnapshot>;
    /// Drop the snapshot of a session.
    fn invalidate(&self, session_id: Uuid);
}

/// Process-local cache.
#[derive(Default)]
pub struct InMemoryStandingsCache {
    entries: DashMap<Uuid, Arc<StandingsSnapshot>>,
}

impl InMemoryStandingsCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StandingsCache for InMemoryStandingsCache {
    fn get(&self, session_id: Uuid) -> Option<Arc<StandingsSnapshot>> {
        self.entries.get(&session_id).map(|entry| entry.clone())
    }

    fn put(&self, snapshot: StandingsSnapshot) -> Arc<StandingsSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.entries.insert(snapshot.session_id, snapshot.clone());
        snapshot
    }

    fn invalidate(&self, session_id: Uuid) {
        self.entries.remove(&session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_drops_entry() {
        let cache = InMemoryStandingsCache::new();
        let session_id = Uuid::new_v4();
        cache.put(StandingsSnapshot {
            session_id,
            table: Vec::new(),
            top_players: TopPlayers::default(),
            computed_at: SystemTime::now(),
        });

        assert!(cache.get(session_id).is_some());
        cache.invalidate(session_id);
        assert!(cache.get(session_id).is_none());
    }
}
