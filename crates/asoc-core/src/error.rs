//! Error hierarchy for the core protocol: connection, streaming and
//! top-level node errors.

use thiserror::Error;

/// Reasons a session is torn down for violating the protocol, surfaced to
/// `on_peer_down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A DATA or END frame arrived with a sequence number other than
    /// `last + 1` for its stream.
    SequenceGap,
    /// A frame header declared a payload longer than `max_frame_bytes`.
    OversizedFrame,
    /// An inbound stream id's parity did not match the remote's role.
    UnknownStreamParity,
    /// A DATA/END frame carried stream id 0, or a HELLO/ACCEPT frame
    /// arrived again after the session reached `ESTABLISHED`. The CONTROL
    /// frame type is reserved but not fatal: an established session that
    /// receives one drops it silently rather than raising this.
    ControlOnDataPhase,
    /// The acceptor already has an established session with this node id.
    DuplicateNodeId,
}

impl std::fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::SequenceGap => "sequence gap",
            Self::OversizedFrame => "oversized frame",
            Self::UnknownStreamParity => "unknown stream parity",
            Self::ControlOnDataPhase => "control frame on data phase",
            Self::DuplicateNodeId => "duplicate node id",
        };
        f.write_str(text)
    }
}

/// Why a session ended, reported to [`crate::Node::on_peer_down`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerDownReason {
    /// The remote closed its side of the transport cleanly.
    Closed,
    /// A protocol invariant was violated; see the carried reason.
    ProtocolViolation(ProtocolViolation),
    /// The transport failed (reset, EOF, I/O error).
    TransportError,
    /// The handshake did not complete (bad signature, stale timestamp,
    /// timeout, or duplicate node id).
    HandshakeFailed,
    /// The local node is shutting down.
    Aborted,
}

/// Errors from the connection component.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The handshake exchange failed authentication.
    #[error("handshake failed")]
    HandshakeFailed,
    /// The handshake did not complete within its deadline.
    #[error("handshake timed out")]
    HandshakeTimeout,
    /// The outbound connect attempt did not complete within its deadline.
    #[error("connect timed out")]
    ConnectTimeout,
    /// A session-level protocol invariant was violated.
    #[error("protocol violation: {0}")]
    ProtocolViolation(ProtocolViolation),
    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] asoc_transport::TransportError),
    /// A frame failed to decode.
    #[error("codec error: {0}")]
    Codec(#[from] asoc_codec::CodecError),
    /// No established session exists with the given peer.
    #[error("no established session with peer")]
    NoSession,
    /// The session was torn down locally (shutdown or fatal peer error).
    #[error("session closed")]
    Closed,
}

/// Errors from the streaming component.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// `stream()` was called for a peer with no `ESTABLISHED` session.
    #[error("no established session with peer")]
    NoSession,
    /// `chunk_size` fell outside `4 KiB..=16 MiB`.
    #[error("invalid chunk size: {0} bytes (must be between 4 KiB and 16 MiB)")]
    InvalidChunkSize(usize),
}

/// Errors from [`crate::NodeConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `community` was empty.
    #[error("community must not be empty")]
    EmptyCommunity,
    /// `api_key` was shorter than 16 bytes.
    #[error("api_key must be at least 16 bytes, got {0}")]
    ApiKeyTooShort(usize),
    /// `port` or `discovery_port` was 0.
    #[error("port must be nonzero")]
    InvalidPort,
    /// `port` and `discovery_port` were equal.
    #[error("port and discovery_port must differ")]
    PortCollision,
    /// `broadcast_interval_s` was 0.
    #[error("broadcast_interval_s must be at least 1")]
    InvalidBroadcastInterval,
    /// `peer_ttl_s` was shorter than `broadcast_interval_s`.
    #[error("peer_ttl_s must be >= broadcast_interval_s")]
    PeerTtlTooShort,
    /// `max_frame_bytes` was 0.
    #[error("max_frame_bytes must be nonzero")]
    InvalidMaxFrameBytes,
    /// `chunk_size` fell outside `4 KiB..=16 MiB`.
    #[error("chunk_size must be between 4 KiB and 16 MiB")]
    InvalidChunkSize,
    /// A `static_peers` entry failed to parse as `host:port`.
    #[error("invalid static peer address: {0}")]
    InvalidStaticPeer(String),
}

/// Top-level error type for [`crate::Node`] operations.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A connection-layer error.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// A discovery-layer error.
    #[error("discovery error: {0}")]
    Discovery(#[from] asoc_discovery::DiscoveryError),
    /// A streaming-layer error.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The listener could not bind the data port.
    #[error("transport error: {0}")]
    Transport(#[from] asoc_transport::TransportError),
}

/// Result alias for node-level operations.
pub type NodeResult<T> = std::result::Result<T, NodeError>;
