//! Log-safe fingerprints for user input.
//!
//! Search text is never written to logs verbatim; spans carry a truncated BLAKE3
//! fingerprint instead, which is enough to correlate the request, cache and response
//! lines of one query.

use blake3::Hasher;

/// Computes a 64-bit fingerprint of `data`, truncated from the 256-bit BLAKE3 output.
///
/// Collisions only merge two log correlations; nothing keys on this value.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Fingerprint of a search query, scoped by mode so the same text in two modes differs.
#[inline]
pub fn query_fingerprint(mode: &str, text: &str) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(mode.as_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());

    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}
