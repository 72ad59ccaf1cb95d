//! Challenge-replay protection for discovery datagrams.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// Deduplicates `(sender node id, challenge)` pairs so that a replayed
/// discovery datagram only produces one peer-table update.
///
/// Entries expire after [`ReplayCache::ENTRY_TTL`] (120 s), independent of
/// the 60 s timestamp freshness window the codec enforces — this asymmetry
/// is intentional (see the protocol's open questions).
#[derive(Default)]
pub struct ReplayCache {
    seen: DashMap<(Uuid, u32), Instant>,
}

impl ReplayCache {
    /// Replay entries are forgotten after this long.
    pub const ENTRY_TTL: Duration = Duration::from_secs(120);

    /// Create an empty replay cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `(node id, challenge)` pair, returning `true` if it has
    /// already been seen within the TTL window (i.e. this is a replay).
    pub fn check_and_insert(&self, node_id: Uuid, challenge: u32) -> bool {
        let now = Instant::now();
        let key = (node_id, challenge);

        if let Some(seen_at) = self.seen.get(&key) {
            if now.duration_since(*seen_at) < Self::ENTRY_TTL {
                return true;
            }
        }

        self.seen.insert(key, now);
        false
    }

    /// Drop entries older than the TTL window.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.seen
            .retain(|_, seen_at| now.duration_since(*seen_at) < Self::ENTRY_TTL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_not_a_replay() {
        let cache = ReplayCache::new();
        assert!(!cache.check_and_insert(Uuid::new_v4(), 1));
    }

    #[test]
    fn second_sighting_is_a_replay() {
        let cache = ReplayCache::new();
        let id = Uuid::new_v4();
        assert!(!cache.check_and_insert(id, 1));
        assert!(cache.check_and_insert(id, 1));
    }

    #[test]
    fn distinct_challenges_are_distinct_entries() {
        let cache = ReplayCache::new();
        let id = Uuid::new_v4();
        assert!(!cache.check_and_insert(id, 1));
        assert!(!cache.check_and_insert(id, 2));
    }

    #[test]
    fn sweep_forgets_expired_entries() {
        let cache = ReplayCache::new();
        let id = Uuid::new_v4();
        cache.seen.insert((id, 1), Instant::now() - Duration::from_secs(200));
        cache.sweep();
        assert!(!cache.check_and_insert(id, 1));
    }
}
