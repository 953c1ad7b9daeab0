//! AES-256 in counter mode with absolute block addressing.
//!
//! The counter block is the 16-byte IV with its low 32 bits (big-endian)
//! advanced by the block index, so any 16-byte aligned slice of a stream
//! can be transformed on its own given its starting block number.
//!
//! Layout of a counter block:
//!   [ 8-byte IV head (LE u64, movable) | 4 bytes | 4-byte BE counter ]

use aes::Aes256;
use ctr::cipher::generic_array::GenericArray;
use ctr::cipher::{InnerIvInit, KeyInit, StreamCipher, StreamCipherSeek};
use ctr::CtrCore;
use zeroize::Zeroize;

use crate::errors::{Result, SecureDataError};

/// Block size of the underlying cipher in bytes.
pub const BLOCK_SIZE: usize = 16;

/// IV length in bytes.
pub const IV_LEN: usize = BLOCK_SIZE;

type Aes256Ctr = ctr::Ctr32BE<Aes256>;

/// A keyed AES-256-CTR stream.
///
/// `transform_at` XORs the keystream into a buffer in place, so encrypting
/// and decrypting are the same call.
#[derive(Clone)]
pub struct AesCtr {
    aes: Aes256,
    iv: [u8; IV_LEN],
}

impl AesCtr {
    /// Build a stream from a 32-byte key and a 16-byte IV.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        let aes = Aes256::new_from_slice(key)
            .map_err(|e| SecureDataError::state(format!("invalid cipher key length: {e}")))?;
        let iv: [u8; IV_LEN] = iv
            .try_into()
            .map_err(|_| SecureDataError::state(format!("cipher IV must be {IV_LEN} bytes")))?;
        Ok(Self { aes, iv })
    }

    /// Returns `true` if `len` is a whole number of cipher blocks.
    pub fn is_block_aligned(len: usize) -> bool {
        len % BLOCK_SIZE == 0
    }

    /// Transform `buf` in place starting at block `counter`.
    ///
    /// The buffer must be block aligned.
    pub fn transform_at(&self, buf: &mut [u8], counter: u32) -> Result<()> {
        if !Self::is_block_aligned(buf.len()) {
            return Err(SecureDataError::state(format!(
                "cipher buffer length {} is not a multiple of {BLOCK_SIZE}",
                buf.len()
            )));
        }
        let core = CtrCore::inner_iv_init(self.aes.clone(), GenericArray::from_slice(&self.iv));
        let mut stream = Aes256Ctr::from_core(core);
        stream.seek(u64::from(counter) * BLOCK_SIZE as u64);
        stream.apply_keystream(buf);
        Ok(())
    }

    /// Shift the IV head (first 8 bytes, little-endian) by `delta`.
    ///
    /// `move_iv(n)` followed by `move_iv(-n)` restores the original IV.
    pub fn move_iv(&mut self, delta: i64) {
        let mut head = [0u8; 8];
        head.copy_from_slice(&self.iv[..8]);
        let moved = u64::from_le_bytes(head).wrapping_add(delta as u64);
        self.iv[..8].copy_from_slice(&moved.to_le_bytes());
    }
}

impl Drop for AesCtr {
    fn drop(&mut self) {
        self.iv.zeroize();
    }
}
