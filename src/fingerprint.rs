//! Content fingerprints for change detection
//!
//! A fingerprint is the SHA-256 hex digest of raw bytes. It is computed
//! before any transformation, so identical inputs always compare equal
//! regardless of file timestamps.

use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of some input bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
