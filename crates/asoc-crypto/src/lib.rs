//! # ASoc Crypto
//!
//! Cryptographic primitives used by the ASoc wire codec:
//!
//! - **Community hashing**: SHA-256 projection used to namespace discovery
//!   traffic between clusters.
//! - **HMAC-SHA256 signing**: authenticates discovery datagrams and the
//!   HELLO/ACCEPT handshake payloads.
//! - **Constant-time comparison**: verifies HMAC tags without a timing
//!   side-channel.
//! - **CSPRNG helpers**: challenge and session-token generation.
//!
//! This crate has no knowledge of the wire formats themselves (see
//! `asoc-codec`); it only supplies the primitives those formats are built
//! from.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constant_time;
pub mod error;
pub mod hash;
pub mod hmac_sign;
pub mod random;

pub use constant_time::ct_eq;
pub use error::CryptoError;
pub use hash::{COMMUNITY_HASH_LEN, community_hash};
pub use hmac_sign::{hmac_sha256, sign, verify};
pub use random::{fill_random, random_token, random_u32};
