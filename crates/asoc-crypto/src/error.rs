//! Error types for the ASoc crypto primitives.

use thiserror::Error;

/// Crypto-layer errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The OS CSPRNG failed to fill a buffer.
    #[error("random number generation failed")]
    RandomFailed,
}
