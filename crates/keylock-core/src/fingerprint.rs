// keylock - log-safe fingerprints of license keys and hardware ids

use sha2::{Digest, Sha256};

/// Number of hex characters kept in a fingerprint.
const FINGERPRINT_LEN: usize = 12;

/// Computes the SHA-256 hash of the input bytes and returns it as a lowercase hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Returns a short, stable identifier for a secret value suitable for logs.
///
/// License keys and hwids are never written to logs directly.
pub fn fingerprint(secret: &str) -> String {
    let mut digest = sha256_hex(secret.as_bytes());
    digest.truncate(FINGERPRINT_LEN);
    digest
}
