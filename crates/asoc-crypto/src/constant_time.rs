//! Constant-time byte comparison.
//!
//! Used to compare HMAC tags without leaking timing information about
//! where the first mismatching byte occurs.

use subtle::ConstantTimeEq;

/// Constant-time comparison of byte slices.
///
/// Returns `true` if the slices are equal, `false` otherwise. Execution
/// time depends only on slice length, not content. Slices of differing
/// length are unequal, but the length check itself is not constant-time
/// (lengths are not secret here).
#[must_use]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
