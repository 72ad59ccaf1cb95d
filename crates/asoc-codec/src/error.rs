//! Decode errors for the ASoc wire codec.

use thiserror::Error;

/// Errors produced while decoding a wire structure.
///
/// Every decode operation in this crate fails with exactly one of these
/// variants; none of them carry secret material (keys, tags, or raw
/// signature bytes) so they are safe to log directly.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer was shorter than the structure requires.
    #[error("buffer too short: expected at least {expected}, got {actual}")]
    ShortBuffer {
        /// Minimum required length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// The version nibble did not match the supported protocol version.
    #[error("unsupported protocol version: {0}")]
    BadVersion(u8),

    /// The frame type nibble did not correspond to a known frame type.
    #[error("unknown frame type: {0}")]
    UnknownType(u8),

    /// A declared length field did not match the available payload.
    #[error("bad length field")]
    BadLength,

    /// The HMAC signature failed verification.
    #[error("signature verification failed")]
    BadSignature,

    /// The embedded timestamp fell outside the accepted freshness window.
    #[error("timestamp outside freshness window")]
    StaleTimestamp,
}
