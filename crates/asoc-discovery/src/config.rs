//! Discovery component configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for a [`crate::DiscoveryManager`].
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Cluster community string; hashed to its 8-byte wire projection.
    pub community: String,
    /// Shared API key used to sign and verify discovery datagrams.
    pub api_key: Vec<u8>,
    /// TCP port this node advertises for incoming sessions.
    pub advertised_port: u16,
    /// UDP port discovery binds to for broadcast send/receive.
    pub discovery_port: u16,
    /// Whether to run the broadcast emit/receive loops at all.
    pub enable_discovery: bool,
    /// Statically-known peer endpoints, always considered part of the
    /// membership regardless of `enable_discovery` (hybrid mode when both
    /// are set).
    pub static_peers: Vec<SocketAddr>,
    /// Interval between discovery broadcasts (jitter is applied on top).
    pub broadcast_interval: Duration,
    /// How long a peer record survives without being refreshed.
    pub peer_ttl: Duration,
    /// Acceptable clock skew between the timestamp in a datagram and the
    /// local clock.
    pub timestamp_skew: Duration,
}

impl DiscoveryConfig {
    /// Default discovery UDP port.
    pub const DEFAULT_DISCOVERY_PORT: u16 = 9999;
    /// Default broadcast interval.
    pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(3);
    /// Default peer time-to-live.
    pub const DEFAULT_PEER_TTL: Duration = Duration::from_secs(15);
    /// Default timestamp freshness window.
    pub const DEFAULT_TIMESTAMP_SKEW: Duration = Duration::from_secs(60);

    /// Jitter applied on top of `broadcast_interval` to de-synchronize
    /// clusters whose nodes started at the same time.
    pub const BROADCAST_JITTER: Duration = Duration::from_millis(250);
}
