//! Password-based key derivation using Argon2d.
//!
//! The three cost parameters are persisted in the store header so a store
//! is always reopened with exactly the settings it was created with.
//! Defaults come from `KdfParams::default` or `.securedata.toml`.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::crypto::keys::SecretKey;
use crate::errors::{Result, SecureDataError};

/// Length of the salt in bytes (one cipher block).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
const KEY_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Largest memory cost accepted in KiB (1 GB).
pub const MAX_MEMORY_KIB: u32 = 1 << 20;

/// Largest pass count accepted.
pub const MAX_TIME_COST: u32 = 64;

/// Largest lane count accepted.
pub const MAX_PARALLELISM: u32 = 16;

/// Argon2d cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of passes over memory (default: 5).
    pub time_cost: u32,
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Parallelism lanes (default: 1).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            time_cost: 5,
            memory_kib: 65_536,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Serialized size: three little-endian u32 values.
    pub const ENCODED_LEN: usize = 12;

    /// Write `time | memory | parallelism` into `out`.
    pub fn encode(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.time_cost.to_le_bytes());
        out[4..8].copy_from_slice(&self.memory_kib.to_le_bytes());
        out[8..12].copy_from_slice(&self.parallelism.to_le_bytes());
    }

    /// Read parameters written by [`KdfParams::encode`].
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::ENCODED_LEN {
            return Err(SecureDataError::corrupted("truncated KDF parameters"));
        }
        let word = |i: usize| u32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        let params = Self {
            time_cost: word(0),
            memory_kib: word(4),
            parallelism: word(8),
        };
        params
            .check()
            .map_err(|why| SecureDataError::corrupted(format!("bad KDF parameters in header: {why}")))?;
        Ok(params)
    }

    /// Bounds shared by new stores and stored headers.
    fn check(&self) -> std::result::Result<(), String> {
        if !(MIN_MEMORY_KIB..=MAX_MEMORY_KIB).contains(&self.memory_kib) {
            return Err(format!(
                "Argon2 memory_kib must be between {MIN_MEMORY_KIB} and {MAX_MEMORY_KIB} (got {})",
                self.memory_kib
            ));
        }
        if !(1..=MAX_TIME_COST).contains(&self.time_cost) {
            return Err(format!(
                "Argon2 time cost must be between 1 and {MAX_TIME_COST} (got {})",
                self.time_cost
            ));
        }
        if !(1..=MAX_PARALLELISM).contains(&self.parallelism) {
            return Err(format!(
                "Argon2 parallelism must be between 1 and {MAX_PARALLELISM} (got {})",
                self.parallelism
            ));
        }
        Ok(())
    }
}

/// Derive a 32-byte key from a password and salt with Argon2d.
///
/// The same password + salt + params will always produce the same key.
/// Parameters outside the accepted bounds are rejected before hashing.
pub fn derive_key(password: &[u8], salt: &[u8], kdf: &KdfParams) -> Result<SecretKey> {
    kdf.check().map_err(SecureDataError::KeyDerivationFailed)?;

    let params = Params::new(kdf.memory_kib, kdf.time_cost, kdf.parallelism, Some(KEY_LEN))
        .map_err(|e| SecureDataError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2d, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| SecureDataError::KeyDerivationFailed(format!("Argon2d hashing failed: {e}")))?;

    Ok(SecretKey::new(key))
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    fill_random(&mut salt);
    salt
}

/// Fill `buf` with cryptographically random bytes.
pub fn fill_random(buf: &mut [u8]) {
    rand::rng().fill_bytes(buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams {
            time_cost: 1,
            memory_kib: 8_192,
            parallelism: 1,
        }
    }

    #[test]
    fn derive_is_deterministic() {
        let salt = [9u8; SALT_LEN];
        let a = derive_key(b"pw", &salt, &fast()).unwrap();
        let b = derive_key(b"pw", &salt, &fast()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn derive_differs_by_password_and_salt() {
        let a = derive_key(b"pw1", &[1u8; SALT_LEN], &fast()).unwrap();
        let b = derive_key(b"pw2", &[1u8; SALT_LEN], &fast()).unwrap();
        let c = derive_key(b"pw1", &[2u8; SALT_LEN], &fast()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn rejects_weak_params() {
        let salt = [0u8; SALT_LEN];
        let low_mem = KdfParams {
            memory_kib: 1024,
            ..fast()
        };
        assert!(derive_key(b"pw", &salt, &low_mem).is_err());
        let no_time = KdfParams {
            time_cost: 0,
            ..fast()
        };
        assert!(derive_key(b"pw", &salt, &no_time).is_err());
    }

    #[test]
    fn rejects_runaway_params_before_hashing() {
        let salt = [0u8; SALT_LEN];
        for huge in [
            KdfParams {
                memory_kib: u32::MAX,
                ..fast()
            },
            KdfParams {
                time_cost: MAX_TIME_COST + 1,
                ..fast()
            },
            KdfParams {
                parallelism: MAX_PARALLELISM + 1,
                ..fast()
            },
        ] {
            assert!(matches!(
                derive_key(b"pw", &salt, &huge),
                Err(SecureDataError::KeyDerivationFailed(_))
            ));
        }
    }

    #[test]
    fn out_of_range_header_words_are_corruption() {
        let mut raw = [0u8; KdfParams::ENCODED_LEN];
        fast().encode(&mut raw);
        raw[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            KdfParams::decode(&raw),
            Err(SecureDataError::Corrupted(_))
        ));

        fast().encode(&mut raw);
        raw[8..12].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            KdfParams::decode(&raw),
            Err(SecureDataError::Corrupted(_))
        ));
    }

    #[test]
    fn params_encode_decode() {
        let p = KdfParams {
            time_cost: 3,
            memory_kib: 70_000,
            parallelism: 2,
        };
        let mut raw = [0u8; KdfParams::ENCODED_LEN];
        p.encode(&mut raw);
        assert_eq!(raw[0..4], 3u32.to_le_bytes());
        assert_eq!(KdfParams::decode(&raw).unwrap(), p);
        assert!(KdfParams::decode(&raw[..8]).is_err());
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
