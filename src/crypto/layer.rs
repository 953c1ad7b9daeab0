//! Addressing modes over one record key.
//!
//! A record that is encrypted with its own key owns exactly one stream,
//! keyed by `(key, record salt)`. It is used two ways:
//!
//! - **Local**: the IV is the salt itself and the counter starts at 0 at
//!   the beginning of the record's self region.
//! - **Wide**: the IV head is shifted by a descendant's id, giving every
//!   descendant its own keystream over its layer region without storing
//!   any per-descendant state.

use crate::crypto::cipher::AesCtr;
use crate::crypto::keys::SecretKey;
use crate::errors::Result;

/// A record's key stream in local addressing.
#[derive(Clone)]
pub struct LayerCipher {
    stream: AesCtr,
}

impl LayerCipher {
    /// Build the local stream from an item key and the record salt.
    pub fn new(key: &SecretKey, salt: &[u8]) -> Result<Self> {
        Ok(Self {
            stream: AesCtr::new(key.as_bytes(), salt)?,
        })
    }

    /// The wide stream this record applies to descendant `id`.
    pub fn wide(&self, id: u32) -> Self {
        let mut stream = self.stream.clone();
        stream.move_iv(i64::from(id));
        Self { stream }
    }

    /// Transform `buf` starting at block `counter`.
    pub fn transform_at(&self, buf: &mut [u8], counter: u32) -> Result<()> {
        self.stream.transform_at(buf, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> LayerCipher {
        LayerCipher::new(&SecretKey::new([7u8; 32]), &[3u8; 16]).unwrap()
    }

    fn keystream(c: &LayerCipher) -> [u8; 32] {
        let mut buf = [0u8; 32];
        c.transform_at(&mut buf, 0).unwrap();
        buf
    }

    #[test]
    fn wide_streams_differ_per_id() {
        let c = cipher();
        let a = keystream(&c.wide(1));
        let b = keystream(&c.wide(2));
        let local = keystream(&c);
        assert_ne!(a, b);
        assert_ne!(a, local);
        assert_ne!(b, local);
    }

    #[test]
    fn wide_stream_leaves_the_local_one_alone() {
        let c = cipher();
        let before = keystream(&c);
        let first = keystream(&c.wide(9));
        assert_eq!(keystream(&c), before);
        assert_eq!(keystream(&c.wide(9)), first);
        assert_eq!(keystream(&cipher()), before);
    }

    #[test]
    fn transform_at_matches_sequential_offset() {
        let wide = cipher().wide(5);
        let whole = keystream(&wide);
        let mut tail = [0u8; 16];
        wide.transform_at(&mut tail, 1).unwrap();
        assert_eq!(&whole[16..], &tail);
    }
}
