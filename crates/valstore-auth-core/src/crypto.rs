//! Hashing helpers for log correlation
//!
//! Tokens and cookie values must never reach the logs. A truncated SHA-256
//! fingerprint lets operators correlate log lines for the same credential
//! without being able to recover it.

use sha2::{Digest, Sha256};

/// Hex characters kept from the digest
const FINGERPRINT_LEN: usize = 12;

/// Full SHA-256 of a secret as lowercase hex
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short, log-safe fingerprint of a secret
pub fn fingerprint(secret: &str) -> String {
    let mut hash = hash_secret(secret);
    hash.truncate(FINGERPRINT_LEN);
    hash
}
