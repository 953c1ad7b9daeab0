//! Cryptographic primitives for SecureData.
//!
//! This module provides:
//! - AES-256-CTR with absolute counter addressing (`cipher`)
//! - Local/wide addressing of a record key stream (`layer`)
//! - Argon2d password-based key derivation (`kdf`)
//! - SHA-256 record digests and the HMAC integrity chain (`hash`)
//! - Zeroizing key wrapper and HKDF sub-keys (`keys`)

pub mod cipher;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod layer;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{derive_key, KdfParams, SecretKey, ...};
pub use cipher::AesCtr;
pub use hash::IntegrityChain;
pub use kdf::{derive_key, generate_salt, KdfParams};
pub use keys::SecretKey;
pub use layer::LayerCipher;
