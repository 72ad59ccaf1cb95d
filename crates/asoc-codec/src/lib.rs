//! # ASoc Codec
//!
//! Bit-exact, stateless, thread-safe serialization of the ASoc wire
//! protocol units:
//!
//! - [`discovery`]: the 50-byte broadcast discovery datagram.
//! - [`frame`]: the 14-byte frame header shared by every frame on an
//!   established session.
//! - [`handshake`]: the 36-byte HELLO and 16-byte ACCEPT payloads that
//!   promote a raw transport into an authenticated session.
//!
//! All multi-byte integers are big-endian. None of the encode/decode
//! functions allocate beyond the fixed-size arrays they return, and none
//! hold any state between calls.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod discovery;
pub mod error;
pub mod frame;
pub mod handshake;

pub use discovery::{DISCOVERY_DATAGRAM_LEN, DiscoveryDatagram, decode_and_verify_discovery, encode_discovery};
pub use error::CodecError;
pub use frame::{FRAME_HEADER_LEN, FrameHeader, FrameType, decode_frame_header, encode_frame_header};
pub use handshake::{
    ACCEPT_LEN, AcceptPayload, HELLO_LEN, HelloPayload, decode_and_verify_hello, encode_accept,
    encode_hello, generate_accept, verify_accept,
};
