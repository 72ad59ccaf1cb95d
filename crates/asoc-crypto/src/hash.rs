//! SHA-256 hashing and community-identifier projection.

use sha2::{Digest, Sha256};

/// Number of bytes of the community hash carried on the wire.
pub const COMMUNITY_HASH_LEN: usize = 8;

/// Project a community identifier string onto its 8-byte wire hash.
///
/// The projection is the first 8 bytes of SHA-256(community). It is not a
/// secret; it exists purely for namespace isolation between clusters that
/// happen to share a discovery broadcast domain.
#[must_use]
pub fn community_hash(community: &str) -> [u8; COMMUNITY_HASH_LEN] {
    let digest = Sha256::digest(community.as_bytes());
    let mut out = [0u8; COMMUNITY_HASH_LEN];
    out.copy_from_slice(&digest[..COMMUNITY_HASH_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_sha256_prefix() {
        let digest = Sha256::digest(b"my-cluster");
        assert_eq!(community_hash("my-cluster"), digest[..8]);
    }

    #[test]
    fn deterministic() {
        assert_eq!(community_hash("abc"), community_hash("abc"));
    }

    #[test]
    fn distinguishes_distinct_strings() {
        assert_ne!(community_hash("cluster-a"), community_hash("cluster-b"));
    }
}
