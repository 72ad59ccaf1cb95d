//! Node identity.

use std::fmt;
use std::net::SocketAddr;

use uuid::Uuid;

/// A node's identity within a community.
///
/// Generated fresh (`generate`) on every process start — ASoc has no
/// persistent identity store, so restarting a node is indistinguishable
/// from a new node joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Draw a fresh random identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic identity for a statically-configured peer whose real
    /// id hasn't been learned yet (no identity field travels in ACCEPT).
    /// Stable for the lifetime of the process so reconnect attempts and
    /// session bookkeeping agree on who this peer is; superseded once
    /// discovery or a HELLO frame reveals the peer's real id.
    #[must_use]
    pub(crate) fn from_address(addr: SocketAddr) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_DNS, addr.to_string().as_bytes()))
    }

    #[must_use]
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
