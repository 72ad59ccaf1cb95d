//! The discovery manager: broadcast/receive loops plus the peer table they
//! feed.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::peer_table::{PeerRecord, PeerTable};
use crate::replay_cache::ReplayCache;

/// Emitted on the subscription channel the first time a peer is seen (or
/// re-seen after eviction).
#[derive(Debug, Clone, Copy)]
pub struct PeerSeen {
    /// The peer's node identity.
    pub node_id: Uuid,
    /// The endpoint (sender IP, advertised TCP port) it announced.
    pub endpoint: SocketAddr,
}

/// Capacity of the peer-seen broadcast channel. Generous relative to the
/// broadcast cadence; a lagging subscriber only misses the oldest events.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

/// Publishes this node's presence and collects the set of reachable peers
/// sharing the same community and API key.
pub struct DiscoveryManager {
    config: DiscoveryConfig,
    community_hash: [u8; 8],
    node_id: Uuid,
    peer_table: Arc<PeerTable>,
    replay_cache: Arc<ReplayCache>,
    socket: Option<Arc<asoc_transport::DiscoverySocket>>,
    subscribers: broadcast::Sender<PeerSeen>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DiscoveryManager {
    /// Bind the discovery socket (unless discovery is disabled) and start
    /// the emit and receive loops.
    pub async fn start(node_id: Uuid, config: DiscoveryConfig) -> Result<Arc<Self>, DiscoveryError> {
        let community_hash = asoc_crypto::community_hash(&config.community);
        let socket = if config.enable_discovery {
            Some(Arc::new(asoc_transport::DiscoverySocket::bind(
                config.discovery_port,
            )?))
        } else {
            None
        };

        let (subscribers, _rx) = broadcast::channel(SUBSCRIBER_CHANNEL_CAPACITY);

        let manager = Arc::new(Self {
            config,
            community_hash,
            node_id,
            peer_table: Arc::new(PeerTable::new()),
            replay_cache: Arc::new(ReplayCache::new()),
            socket,
            subscribers,
            tasks: Mutex::new(Vec::new()),
        });

        if manager.socket.is_some() {
            let emit_handle = tokio::spawn({
                let manager = manager.clone();
                async move { manager.emit_loop().await }
            });
            let receive_handle = tokio::spawn({
                let manager = manager.clone();
                async move { manager.receive_loop().await }
            });
            manager.tasks.lock().await.extend([emit_handle, receive_handle]);
        }

        tracing::info!(
            node_id = %node_id,
            discovery_enabled = manager.socket.is_some(),
            static_peers = manager.config.static_peers.len(),
            "discovery manager started"
        );

        Ok(manager)
    }

    /// Stop the emit/receive loops and release the socket. Idempotent.
    pub async fn stop(&self) {
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    /// A consistent snapshot of currently-live discovered peers, ordered by
    /// last-seen descending.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PeerRecord> {
        self.peer_table.snapshot()
    }

    /// Subscribe to newly-seen-peer notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PeerSeen> {
        self.subscribers.subscribe()
    }

    /// The statically configured peer endpoints (always part of
    /// membership; combined with discovered peers in hybrid mode).
    #[must_use]
    pub fn static_peers(&self) -> &[SocketAddr] {
        &self.config.static_peers
    }

    /// Direct access to the peer table, so the connection component can
    /// report connection failures/successes back into it.
    #[must_use]
    pub fn peer_table(&self) -> &Arc<PeerTable> {
        &self.peer_table
    }

    async fn emit_loop(&self) {
        loop {
            self.peer_table.expire(self.config.peer_ttl);
            self.replay_cache.sweep();

            if let Err(error) = self.broadcast_once().await {
                tracing::warn!(%error, "discovery broadcast failed");
            }

            tokio::time::sleep(jittered_interval(self.config.broadcast_interval)).await;
        }
    }

    async fn broadcast_once(&self) -> Result<(), DiscoveryError> {
        let Some(socket) = &self.socket else {
            return Ok(());
        };

        let challenge = match asoc_crypto::random_u32() {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, "failed to draw discovery challenge");
                return Ok(());
            }
        };

        let datagram = asoc_codec::encode_discovery(
            self.community_hash,
            self.node_id,
            self.config.advertised_port,
            now_secs(),
            challenge,
            &self.config.api_key,
        );

        socket.send_broadcast(&datagram).await?;
        Ok(())
    }

    async fn receive_loop(&self) {
        let Some(socket) = &self.socket else {
            return;
        };

        let mut buf = [0u8; 512];
        loop {
            match socket.recv_from(&mut buf).await {
                Ok((len, from_addr)) => self.handle_datagram(&buf[..len], from_addr),
                Err(error) => tracing::warn!(%error, "discovery receive failed"),
            }
        }
    }

    fn handle_datagram(&self, buf: &[u8], from_addr: SocketAddr) {
        let skew_secs = self.config.timestamp_skew.as_secs().min(u64::from(u32::MAX)) as u32;
        let datagram = match asoc_codec::decode_and_verify_discovery(
            buf,
            &self.community_hash,
            &self.config.api_key,
            now_secs(),
            skew_secs,
        ) {
            Ok(datagram) => datagram,
            Err(error) => {
                tracing::trace!(%error, %from_addr, "dropped malformed discovery datagram");
                return;
            }
        };

        if datagram.node_id == self.node_id {
            return;
        }

        if self
            .replay_cache
            .check_and_insert(datagram.node_id, datagram.challenge)
        {
            tracing::trace!(node_id = %datagram.node_id, "dropped replayed discovery datagram");
            return;
        }

        let endpoint = SocketAddr::new(from_addr.ip(), datagram.port);
        let is_new = self.peer_table.upsert(datagram.node_id, endpoint);

        if is_new {
            tracing::debug!(node_id = %datagram.node_id, %endpoint, "discovered new peer");
            let _ = self.subscribers.send(PeerSeen {
                node_id: datagram.node_id,
                endpoint,
            });
        }
    }
}

fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as u32
}

fn jittered_interval(base: Duration) -> Duration {
    let jitter_ms = DiscoveryConfig::BROADCAST_JITTER.as_millis() as i64;
    let offset = rand::thread_rng().gen_range(-jitter_ms..=jitter_ms);
    if offset >= 0 {
        base + Duration::from_millis(offset as u64)
    } else {
        base.saturating_sub(Duration::from_millis((-offset) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_within_window() {
        for _ in 0..100 {
            let interval = jittered_interval(Duration::from_secs(3));
            assert!(interval >= Duration::from_millis(2750));
            assert!(interval <= Duration::from_millis(3250));
        }
    }
}
