//! Transport-layer errors.

use std::io;
use thiserror::Error;

/// Errors produced by the discovery socket or the TCP session transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Binding the local socket failed.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// Address the bind was attempted on.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A connect attempt failed or timed out.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        /// Address the connect was attempted to.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A connect attempt exceeded the configured timeout.
    #[error("connect to {addr} timed out")]
    ConnectTimeout {
        /// Address the connect was attempted to.
        addr: String,
    },

    /// A send or receive operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
