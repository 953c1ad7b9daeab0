//! Record digests and the whole-file integrity chain.
//!
//! Records carry a plain SHA-256 over their stored bytes. The file as a
//! whole is covered by an HMAC-SHA256 that is fed incrementally as records
//! are appended; [`IntegrityChain::snapshot`] finalizes a clone so the
//! running accumulation is never disturbed.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::crypto::keys::SecretKey;
use crate::errors::{Result, SecureDataError};

/// Digest length in bytes.
pub const HASH_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 over `data`.
pub fn digest(data: &[u8]) -> [u8; HASH_LEN] {
    Sha256::digest(data).into()
}

/// SHA-256 over the concatenation of `parts`.
pub fn digest_parts(parts: &[&[u8]]) -> [u8; HASH_LEN] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Constant-time equality for digests and check values.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Running keyed hash of "everything written so far".
#[derive(Clone)]
pub struct IntegrityChain {
    mac: HmacSha256,
}

impl IntegrityChain {
    /// Start an empty chain keyed with the store's integrity key.
    pub fn new(key: &SecretKey) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| SecureDataError::KeyDerivationFailed(format!("invalid HMAC key: {e}")))?;
        Ok(Self { mac })
    }

    /// Fold more persisted bytes into the chain.
    pub fn update(&mut self, bytes: &[u8]) {
        self.mac.update(bytes);
    }

    /// Finalize a copy of the chain without consuming it.
    pub fn snapshot(&self) -> [u8; HASH_LEN] {
        self.mac.clone().finalize().into_bytes().into()
    }

    /// Compare a copy of the chain with `expected` in constant time.
    pub fn matches(&self, expected: &[u8]) -> bool {
        self.mac.clone().verify_slice(expected).is_ok()
    }
}
