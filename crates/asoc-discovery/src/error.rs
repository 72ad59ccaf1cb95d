//! Discovery-layer errors.

use thiserror::Error;

/// Errors surfaced by the discovery component.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The discovery socket could not be bound.
    #[error("discovery socket unavailable: {0}")]
    SocketUnavailable(#[from] asoc_transport::TransportError),
}
