//! HELLO and ACCEPT handshake payload encoding and verification.
//!
//! ```text
//! HELLO  (36 B): 16 B node UUID || 4 B challenge || 16 B HMAC-SHA256(key, UUID || challenge)[0..16]
//! ACCEPT (16 B): 8 B session token || 8 B HMAC-SHA256(key, token)[0..8]
//! ```

use uuid::Uuid;

use crate::error::CodecError;

/// Encoded size of a HELLO payload in bytes.
pub const HELLO_LEN: usize = 36;
/// Encoded size of an ACCEPT payload in bytes.
pub const ACCEPT_LEN: usize = 16;

const HELLO_SIGNED_LEN: usize = 20;
const HELLO_SIGNATURE_LEN: usize = 16;
const ACCEPT_TOKEN_LEN: usize = 8;
const ACCEPT_SIGNATURE_LEN: usize = 8;

/// A verified HELLO payload, sent by the initiator to open a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloPayload {
    /// Initiator's node identity.
    pub node_id: Uuid,
    /// Fresh challenge drawn for this handshake attempt.
    pub challenge: u32,
}

/// A verified ACCEPT payload, sent by the acceptor in reply to HELLO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptPayload {
    /// Session token issued by the acceptor.
    pub token: [u8; ACCEPT_TOKEN_LEN],
}

fn hello_signed_bytes(node_id: Uuid, challenge: u32) -> [u8; HELLO_SIGNED_LEN] {
    let mut buf = [0u8; HELLO_SIGNED_LEN];
    buf[0..16].copy_from_slice(node_id.as_bytes());
    buf[16..20].copy_from_slice(&challenge.to_be_bytes());
    buf
}

/// Encode and sign a HELLO payload.
#[must_use]
pub fn encode_hello(node_id: Uuid, challenge: u32, api_key: &[u8]) -> [u8; HELLO_LEN] {
    let signed = hello_signed_bytes(node_id, challenge);
    let signature = asoc_crypto::sign(api_key, &signed, HELLO_SIGNATURE_LEN);

    let mut out = [0u8; HELLO_LEN];
    out[..HELLO_SIGNED_LEN].copy_from_slice(&signed);
    out[HELLO_SIGNED_LEN..].copy_from_slice(&signature);
    out
}

/// Decode and verify a HELLO payload.
pub fn decode_and_verify_hello(buf: &[u8], api_key: &[u8]) -> Result<HelloPayload, CodecError> {
    if buf.len() != HELLO_LEN {
        return Err(CodecError::ShortBuffer {
            expected: HELLO_LEN,
            actual: buf.len(),
        });
    }

    let node_id = Uuid::from_slice(&buf[0..16]).map_err(|_| CodecError::BadLength)?;
    let challenge = u32::from_be_bytes(buf[16..20].try_into().unwrap());
    let signature = &buf[HELLO_SIGNED_LEN..HELLO_LEN];

    if !asoc_crypto::verify(api_key, &buf[..HELLO_SIGNED_LEN], signature) {
        return Err(CodecError::BadSignature);
    }

    Ok(HelloPayload { node_id, challenge })
}

/// Encode and sign an ACCEPT payload for a caller-supplied session token.
///
/// Pure and deterministic; callers draw the token with
/// [`asoc_crypto::random_token`] before calling this.
#[must_use]
pub fn encode_accept(token: [u8; ACCEPT_TOKEN_LEN], api_key: &[u8]) -> [u8; ACCEPT_LEN] {
    let signature = asoc_crypto::sign(api_key, &token, ACCEPT_SIGNATURE_LEN);

    let mut out = [0u8; ACCEPT_LEN];
    out[..ACCEPT_TOKEN_LEN].copy_from_slice(&token);
    out[ACCEPT_TOKEN_LEN..].copy_from_slice(&signature);
    out
}

/// Draw a fresh session token and encode a signed ACCEPT payload for it.
pub fn generate_accept(
    api_key: &[u8],
) -> Result<([u8; ACCEPT_LEN], [u8; ACCEPT_TOKEN_LEN]), asoc_crypto::CryptoError> {
    let token = asoc_crypto::random_token()?;
    Ok((encode_accept(token, api_key), token))
}

/// Verify an ACCEPT payload, returning the session token on success.
pub fn verify_accept(buf: &[u8], api_key: &[u8]) -> Result<AcceptPayload, CodecError> {
    if buf.len() != ACCEPT_LEN {
        return Err(CodecError::ShortBuffer {
            expected: ACCEPT_LEN,
            actual: buf.len(),
        });
    }

    let mut token = [0u8; ACCEPT_TOKEN_LEN];
    token.copy_from_slice(&buf[..ACCEPT_TOKEN_LEN]);
    let signature = &buf[ACCEPT_TOKEN_LEN..ACCEPT_LEN];

    if !asoc_crypto::verify(api_key, &token, signature) {
        return Err(CodecError::BadSignature);
    }

    Ok(AcceptPayload { token })
}
