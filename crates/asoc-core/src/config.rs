//! Node configuration.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ConfigError;

/// Minimum allowed `chunk_size`, in bytes.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;
/// Maximum allowed `chunk_size`, in bytes.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Configuration for a [`crate::Node`].
///
/// Carries only the recognized options; there is deliberately no file or
/// environment loader here, that integration lives outside this crate.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Cluster community string.
    pub community: String,
    /// Shared API key. Minimum 16 bytes, 32 recommended.
    pub api_key: Vec<u8>,
    /// TCP port this node listens on for incoming sessions.
    pub port: u16,
    /// UDP port used for discovery broadcast send/receive.
    pub discovery_port: u16,
    /// Statically-known peer addresses, always part of membership.
    pub static_peers: Vec<SocketAddr>,
    /// Whether to run the discovery broadcast/receive loops.
    pub enable_discovery: bool,
    /// Interval between discovery broadcasts (jitter applied on top).
    pub broadcast_interval: Duration,
    /// How long a discovered peer record survives without a refresh.
    pub peer_ttl: Duration,
    /// Deadline for the HELLO/ACCEPT exchange.
    pub handshake_timeout: Duration,
    /// Deadline for the outbound TCP connect.
    pub connect_timeout: Duration,
    /// Idle-receive deadline on an established session.
    pub idle_timeout: Duration,
    /// Deadline for draining queued frames during shutdown.
    pub send_drain_timeout: Duration,
    /// Maximum accepted frame payload length.
    pub max_frame_bytes: u32,
    /// Default chunk size for `stream()` calls that don't override it.
    pub chunk_size: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            community: String::new(),
            api_key: Vec::new(),
            port: 9000,
            discovery_port: 9999,
            static_peers: Vec::new(),
            enable_discovery: true,
            broadcast_interval: Duration::from_secs(3),
            peer_ttl: Duration::from_secs(15),
            handshake_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
            send_drain_timeout: Duration::from_secs(5),
            max_frame_bytes: 16 * 1024 * 1024,
            chunk_size: 1024 * 1024,
        }
    }
}

impl NodeConfig {
    /// Construct a config with the required fields and every other value
    /// defaulted.
    #[must_use]
    pub fn new(community: impl Into<String>, api_key: impl Into<Vec<u8>>) -> Self {
        Self {
            community: community.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration, matching the recognized-option ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.community.is_empty() {
            return Err(ConfigError::EmptyCommunity);
        }
        if self.api_key.len() < 16 {
            return Err(ConfigError::ApiKeyTooShort(self.api_key.len()));
        }
        if self.port == 0 || self.discovery_port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.enable_discovery && self.port == self.discovery_port {
            return Err(ConfigError::PortCollision);
        }
        if self.broadcast_interval.is_zero() {
            return Err(ConfigError::InvalidBroadcastInterval);
        }
        if self.peer_ttl < self.broadcast_interval {
            return Err(ConfigError::PeerTtlTooShort);
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::InvalidMaxFrameBytes);
        }
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(())
    }
}
