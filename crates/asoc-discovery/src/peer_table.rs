//! Time-bounded table of discovered peers.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// A single peer's last-known endpoint, as observed by discovery.
#[derive(Debug, Clone, Copy)]
pub struct PeerRecord {
    /// Peer's node identity.
    pub node_id: Uuid,
    /// Peer's last-seen endpoint (advertised TCP port, sender's IP).
    pub endpoint: SocketAddr,
    /// Local instant this record was last refreshed.
    pub last_seen: Instant,
    /// Consecutive connection failures observed by the connection layer.
    pub consecutive_failures: u32,
}

/// The live peer table.
///
/// Written only by the discovery component (on accepted datagrams and on
/// expiry sweeps); the connection component only reads consistent
/// snapshots via [`PeerTable::snapshot`].
#[derive(Default)]
pub struct PeerTable {
    peers: DashMap<Uuid, PeerRecord>,
}

impl PeerTable {
    /// Create an empty peer table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly-seen peer, or refresh an existing one's endpoint
    /// and timestamp. Returns `true` if this is the first time the peer
    /// has been seen.
    pub fn upsert(&self, node_id: Uuid, endpoint: SocketAddr) -> bool {
        let mut is_new = false;
        self.peers
            .entry(node_id)
            .and_modify(|record| {
                record.endpoint = endpoint;
                record.last_seen = Instant::now();
            })
            .or_insert_with(|| {
                is_new = true;
                PeerRecord {
                    node_id,
                    endpoint,
                    last_seen: Instant::now(),
                    consecutive_failures: 0,
                }
            });
        is_new
    }

    /// Record a connection failure against a peer, evicting it once it
    /// reaches three consecutive failures. Returns `true` if the peer was
    /// evicted.
    pub fn record_failure(&self, node_id: &Uuid) -> bool {
        const MAX_CONSECUTIVE_FAILURES: u32 = 3;

        let evict = self
            .peers
            .get_mut(node_id)
            .map(|mut record| {
                record.consecutive_failures += 1;
                record.consecutive_failures >= MAX_CONSECUTIVE_FAILURES
            })
            .unwrap_or(false);

        if evict {
            self.peers.remove(node_id);
        }
        evict
    }

    /// The current record for a peer, if it is still tracked.
    ///
    /// Used by the reconnection loop to re-read the peer's latest
    /// advertised endpoint on every retry, and to notice that the record
    /// has disappeared (evicted by [`Self::record_failure`], or expired)
    /// without racing a separate `contains` check against it.
    #[must_use]
    pub fn get(&self, node_id: &Uuid) -> Option<PeerRecord> {
        self.peers.get(node_id).map(|entry| *entry.value())
    }

    /// Clear the failure counter for a peer after a successful connection.
    pub fn record_success(&self, node_id: &Uuid) {
        if let Some(mut record) = self.peers.get_mut(node_id) {
            record.consecutive_failures = 0;
        }
    }

    /// Remove an entry outright (used when a peer is explicitly evicted).
    pub fn remove(&self, node_id: &Uuid) {
        self.peers.remove(node_id);
    }

    /// Remove entries that have not been refreshed within `ttl`.
    pub fn expire(&self, ttl: Duration) {
        let now = Instant::now();
        self.peers
            .retain(|_, record| now.duration_since(record.last_seen) < ttl);
    }

    /// A consistent snapshot of the currently live peers, ordered by
    /// last-seen descending (most recently seen first).
    #[must_use]
    pub fn snapshot(&self) -> Vec<PeerRecord> {
        let mut peers: Vec<PeerRecord> = self.peers.iter().map(|entry| *entry.value()).collect();
        peers.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        peers
    }

    /// Number of peers currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the table is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
