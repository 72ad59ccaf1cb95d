//! Discovery datagram encoding, decoding, and HMAC verification.
//!
//! ```text
//! offset  size  field
//! 0       8     community hash  (SHA-256(community)[0..8])
//! 8       16    node UUID
//! 24      2     port
//! 26      4     timestamp (seconds since epoch)
//! 30      4     challenge
//! 34      16    signature = HMAC-SHA256(key, bytes[0..34])[0..16]
//! ```

use uuid::Uuid;

use crate::error::CodecError;

/// Encoded size of a discovery datagram in bytes.
pub const DISCOVERY_DATAGRAM_LEN: usize = 50;

/// Offset at which the signed prefix ends and the signature begins.
const SIGNED_PREFIX_LEN: usize = 34;

/// Length of the truncated HMAC tag carried on the wire.
const SIGNATURE_LEN: usize = 16;

/// A verified discovery datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryDatagram {
    /// SHA-256(community)[0..8], as observed on the wire.
    pub community_hash: [u8; 8],
    /// Sender's node identity.
    pub node_id: Uuid,
    /// TCP port the sender accepts sessions on.
    pub port: u16,
    /// Seconds-since-epoch timestamp the sender stamped the datagram with.
    pub timestamp: u32,
    /// Fresh random challenge, used only for replay-cache keying.
    pub challenge: u32,
}

fn signed_prefix(
    community_hash: &[u8; 8],
    node_id: Uuid,
    port: u16,
    timestamp: u32,
    challenge: u32,
) -> [u8; SIGNED_PREFIX_LEN] {
    let mut buf = [0u8; SIGNED_PREFIX_LEN];
    buf[0..8].copy_from_slice(community_hash);
    buf[8..24].copy_from_slice(node_id.as_bytes());
    buf[24..26].copy_from_slice(&port.to_be_bytes());
    buf[26..30].copy_from_slice(&timestamp.to_be_bytes());
    buf[30..34].copy_from_slice(&challenge.to_be_bytes());
    buf
}

/// Encode and sign a discovery datagram.
#[must_use]
pub fn encode_discovery(
    community_hash: [u8; 8],
    node_id: Uuid,
    port: u16,
    timestamp: u32,
    challenge: u32,
    api_key: &[u8],
) -> [u8; DISCOVERY_DATAGRAM_LEN] {
    let prefix = signed_prefix(&community_hash, node_id, port, timestamp, challenge);
    let signature = asoc_crypto::sign(api_key, &prefix, SIGNATURE_LEN);

    let mut out = [0u8; DISCOVERY_DATAGRAM_LEN];
    out[..SIGNED_PREFIX_LEN].copy_from_slice(&prefix);
    out[SIGNED_PREFIX_LEN..].copy_from_slice(&signature);
    out
}

/// Decode a discovery datagram and verify its community hash, signature,
/// and timestamp freshness.
///
/// `now` and `max_skew_secs` implement the "timestamp within the freshness
/// window" check from the discovery receive loop; callers pass the local
/// clock and the configured skew tolerance (60 s by default).
pub fn decode_and_verify_discovery(
    buf: &[u8],
    expected_community_hash: &[u8; 8],
    api_key: &[u8],
    now: u32,
    max_skew_secs: u32,
) -> Result<DiscoveryDatagram, CodecError> {
    if buf.len() != DISCOVERY_DATAGRAM_LEN {
        return Err(CodecError::ShortBuffer {
            expected: DISCOVERY_DATAGRAM_LEN,
            actual: buf.len(),
        });
    }

    let mut community_hash = [0u8; 8];
    community_hash.copy_from_slice(&buf[0..8]);

    // A community mismatch means this datagram was never meant for our
    // cluster; we treat it the same as an authentication failure rather
    // than leaking the fact that we inspected its community field.
    if &community_hash != expected_community_hash {
        return Err(CodecError::BadSignature);
    }

    let node_id = Uuid::from_slice(&buf[8..24]).map_err(|_| CodecError::BadLength)?;
    let port = u16::from_be_bytes(buf[24..26].try_into().unwrap());
    let timestamp = u32::from_be_bytes(buf[26..30].try_into().unwrap());
    let challenge = u32::from_be_bytes(buf[30..34].try_into().unwrap());
    let signature = &buf[SIGNED_PREFIX_LEN..DISCOVERY_DATAGRAM_LEN];

    let prefix = &buf[..SIGNED_PREFIX_LEN];
    if !asoc_crypto::verify(api_key, prefix, signature) {
        return Err(CodecError::BadSignature);
    }

    let skew = now.abs_diff(timestamp);
    if skew > max_skew_secs {
        return Err(CodecError::StaleTimestamp);
    }

    Ok(DiscoveryDatagram {
        community_hash,
        node_id,
        port,
        timestamp,
        challenge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-secret-key";

    fn hash() -> [u8; 8] {
        asoc_crypto::community_hash("my-cluster")
    }

    #[test]
    fn round_trip() {
        let node_id = Uuid::new_v4();
        let encoded = encode_discovery(hash(), node_id, 9000, 1_000_000, 0xAABB_CCDD, KEY);
        assert_eq!(encoded.len(), DISCOVERY_DATAGRAM_LEN);

        let decoded =
            decode_and_verify_discovery(&encoded, &hash(), KEY, 1_000_000, 60).unwrap();
        assert_eq!(decoded.node_id, node_id);
        assert_eq!(decoded.port, 9000);
        assert_eq!(decoded.timestamp, 1_000_000);
        assert_eq!(decoded.challenge, 0xAABB_CCDD);
    }

    #[test]
    fn flipped_signature_bit_fails() {
        let mut encoded =
            encode_discovery(hash(), Uuid::new_v4(), 9000, 1_000_000, 1, KEY);
        *encoded.last_mut().unwrap() ^= 0x01;
        assert_eq!(
            decode_and_verify_discovery(&encoded, &hash(), KEY, 1_000_000, 60),
            Err(CodecError::BadSignature)
        );
    }

    #[test]
    fn wrong_community_fails() {
        let encoded = encode_discovery(hash(), Uuid::new_v4(), 9000, 1_000_000, 1, KEY);
        let other = asoc_crypto::community_hash("other-cluster");
        assert_eq!(
            decode_and_verify_discovery(&encoded, &other, KEY, 1_000_000, 60),
            Err(CodecError::BadSignature)
        );
    }

    #[test]
    fn wrong_key_fails() {
        let encoded = encode_discovery(hash(), Uuid::new_v4(), 9000, 1_000_000, 1, KEY);
        assert_eq!(
            decode_and_verify_discovery(&encoded, &hash(), b"wrong-key", 1_000_000, 60),
            Err(CodecError::BadSignature)
        );
    }

    #[test]
    fn stale_timestamp_fails() {
        let encoded = encode_discovery(hash(), Uuid::new_v4(), 9000, 1_000_000, 1, KEY);
        assert_eq!(
            decode_and_verify_discovery(&encoded, &hash(), KEY, 1_000_100, 60),
            Err(CodecError::StaleTimestamp)
        );
    }

    #[test]
    fn short_buffer_fails() {
        let buf = [0u8; DISCOVERY_DATAGRAM_LEN - 1];
        assert_eq!(
            decode_and_verify_discovery(&buf, &hash(), KEY, 0, 60),
            Err(CodecError::ShortBuffer {
                expected: DISCOVERY_DATAGRAM_LEN,
                actual: DISCOVERY_DATAGRAM_LEN - 1
            })
        );
    }
}
