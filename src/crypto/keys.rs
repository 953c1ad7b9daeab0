//! Key material and HKDF-SHA256 sub-key derivation.
//!
//! From the master key we derive a dedicated **integrity key** for the
//! whole-file HMAC, so the cipher key and the MAC key are never the same
//! bytes. HKDF (RFC 5869) uses the master key as input keying material
//! and a context string (`info`) to produce independent sub-keys.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{Result, SecureDataError};

/// Length of keys and sub-keys (256 bits).
pub const KEY_LEN: usize = 32;

/// A wrapper around a 32-byte key that automatically zeroes its memory
/// when dropped.
///
/// Used for the master key, item keys and derived sub-keys alike.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey {
    bytes: [u8; KEY_LEN],
}

impl SecretKey {
    /// Create a new `SecretKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to key a cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Derive the whole-file integrity key from this master key.
    pub fn derive_integrity_key(&self) -> Result<SecretKey> {
        hkdf_derive(&self.bytes, b"securedata-integrity")
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Internal helper: run HKDF-SHA256 expand with the given `info`.
///
/// The master key already has high entropy (it came from Argon2d), so it
/// is used directly as input keying material with no extract salt.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<SecretKey> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| SecureDataError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(SecretKey::new(okm))
}
