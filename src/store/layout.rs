//! Bit-exact file layout and the fixed-width field codec.
//!
//! ```text
//! Header (128 bytes, clear)
//!   [0,32)    integrity tag
//!   [32,44)   time cost | memory KiB | parallelism   (3 x u32 LE)
//!   [44,48)   format version                          (u32 LE)
//!   [48,64)   salt
//!   [64,128)  login (UTF-8, NUL-terminated, random fill)
//!
//! Record common part (80 bytes)
//!   [0,32)    hash over [32, size) of the stored bytes
//!   [32,36)   type tag, bit 31 = tombstone            \
//!   [36,40)   id                                       | clear
//!   [40,44)   parent id                                |
//!   [44,48)   flags, bit 0 = encrypted                /
//!   [48,56)   created (Unix ms)                        \
//!   [56,64)   last edit (Unix ms)                       | layer region
//!   [64,80)   salt                                     /  [48, size)
//! ```
//!
//! All integers are little-endian.

use crate::crypto::cipher::BLOCK_SIZE;
use crate::crypto::kdf::{fill_random, SALT_LEN};
use crate::errors::{Result, SecureDataError};

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Total header size; the data region starts right after it.
pub const HEADER_LEN: usize = 128;

/// Length of the integrity tag and of record hashes.
pub const HASH_LEN: usize = 32;

pub const HEADER_KDF_OFFSET: usize = 32;
pub const HEADER_VERSION_OFFSET: usize = 44;
pub const HEADER_SALT_OFFSET: usize = 48;
pub const HEADER_LOGIN_OFFSET: usize = 64;
pub const HEADER_LOGIN_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Record common part
// ---------------------------------------------------------------------------

pub const TAG_OFFSET: usize = 32;
pub const ID_OFFSET: usize = 36;
pub const PARENT_OFFSET: usize = 40;
pub const FLAGS_OFFSET: usize = 44;

/// First byte covered by an encrypted ancestor's wide stream.
pub const LAYER_START: usize = 48;

pub const CREATED_OFFSET: usize = 48;
pub const EDITED_OFFSET: usize = 56;
pub const SALT_OFFSET: usize = 64;

pub const NAME_OFFSET: usize = 80;
pub const NAME_LEN: usize = 64;
pub const DESCRIPTION_OFFSET: usize = 144;
pub const DESCRIPTION_LEN: usize = 256;

/// First byte of the region a record's own key encrypts.
pub const SELF_START: usize = 400;

/// Trailing check value inside the self region.
pub const CHECK_LEN: usize = 16;

/// Wide-stream block counter at which the self region starts.
pub const SELF_WIDE_COUNTER: u32 = ((SELF_START - LAYER_START) / BLOCK_SIZE) as u32;

/// Tombstone marker inside the type tag.
pub const TOMBSTONE_BIT: u32 = 1 << 31;

/// Flag bit: the record carries its own encryption layer.
pub const FLAG_ENCRYPTED: u32 = 1;

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

pub const ACCOUNT_TAG: u32 = 1;
pub const ACCOUNT_LOGIN_OFFSET: usize = 400;
pub const ACCOUNT_LOGIN_LEN: usize = 128;
pub const ACCOUNT_PASSWORD_OFFSET: usize = 528;
pub const ACCOUNT_PASSWORD_LEN: usize = 128;
pub const ACCOUNT_SIZE: usize = 672;

pub const FOLDER_TAG: u32 = 2;
pub const FOLDER_SEAL_LEN: usize = 48;
pub const FOLDER_SIZE: usize = 464;

// ---------------------------------------------------------------------------
// Integer helpers
// ---------------------------------------------------------------------------

pub fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(word)
}

pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn read_i64(buf: &[u8], offset: usize) -> i64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&buf[offset..offset + 8]);
    i64::from_le_bytes(word)
}

pub fn write_i64(buf: &mut [u8], offset: usize, value: i64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

pub fn read_salt(buf: &[u8], offset: usize) -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&buf[offset..offset + SALT_LEN]);
    salt
}

// ---------------------------------------------------------------------------
// Fixed-width strings
// ---------------------------------------------------------------------------

/// Check that `value` fits a `width`-byte field.
pub fn check_str(field: &'static str, value: &str, width: usize) -> Result<()> {
    if value.len() > width {
        return Err(SecureDataError::FieldTooLong { field, max: width });
    }
    if value.as_bytes().contains(&0) {
        return Err(SecureDataError::state(format!(
            "field '{field}' must not contain NUL bytes"
        )));
    }
    Ok(())
}

/// Write `value` into `buf[offset..offset + width]`.
///
/// Shorter values are NUL-terminated and the remainder of the field is
/// filled with random bytes.
pub fn write_str(
    buf: &mut [u8],
    offset: usize,
    width: usize,
    field: &'static str,
    value: &str,
) -> Result<()> {
    check_str(field, value, width)?;
    let slot = &mut buf[offset..offset + width];
    let bytes = value.as_bytes();
    slot[..bytes.len()].copy_from_slice(bytes);
    if bytes.len() < width {
        slot[bytes.len()] = 0;
        fill_random(&mut slot[bytes.len() + 1..]);
    }
    Ok(())
}

/// Read a string written by [`write_str`].
pub fn read_str(buf: &[u8], offset: usize, width: usize, field: &'static str) -> Result<String> {
    let slot = &buf[offset..offset + width];
    let end = slot.iter().position(|&b| b == 0).unwrap_or(width);
    std::str::from_utf8(&slot[..end])
        .map(str::to_owned)
        .map_err(|_| SecureDataError::corrupted(format!("field '{field}' is not valid UTF-8")))
}
