//! Secure random number generation.
//!
//! All randomness comes from the operating system CSPRNG via `getrandom`.

use crate::error::CryptoError;

/// Fill a buffer with random bytes from the OS CSPRNG.
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::getrandom(buf).map_err(|_| CryptoError::RandomFailed)
}

/// Draw a fresh 32-bit challenge value for discovery datagrams and HELLO.
pub fn random_u32() -> Result<u32, CryptoError> {
    let mut buf = [0u8; 4];
    fill_random(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Draw a fresh 8-byte session token for ACCEPT.
pub fn random_token() -> Result<[u8; 8], CryptoError> {
    let mut buf = [0u8; 8];
    fill_random(&mut buf)?;
    Ok(buf)
}
