//! Static table of record variants.
//!
//! Every concrete record type declares its tag and fixed size through
//! [`RecordType`]. The table is validated once per process; a duplicate
//! tag, a tag using the tombstone bit or a misaligned size is a
//! programming error and every later lookup fails with it.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::crypto::cipher::BLOCK_SIZE;
use crate::errors::{Result, SecureDataError};

use super::layout::{CHECK_LEN, SELF_START, TOMBSTONE_BIT};
use super::record::{AccountData, FolderData, Payload};

/// Compile-time description of a concrete record type.
pub trait RecordType {
    /// Unique type tag (must not use the tombstone bit).
    const TAG: u32;
    /// Fixed serialized size (must be block aligned).
    const SIZE: usize;
    /// Human-readable name for logs and listings.
    const NAME: &'static str;

    /// Empty variant payload, filled in by the decoder.
    fn empty() -> Payload;
}

/// One registered variant.
#[derive(Debug, Clone, Copy)]
pub struct Variant {
    pub tag: u32,
    pub size: usize,
    pub name: &'static str,
    pub empty: fn() -> Payload,
}

impl Variant {
    pub fn of<T: RecordType>() -> Self {
        Self {
            tag: T::TAG,
            size: T::SIZE,
            name: T::NAME,
            empty: T::empty,
        }
    }
}

/// Tag -> variant lookup table.
#[derive(Debug)]
pub struct Registry {
    by_tag: HashMap<u32, Variant>,
}

impl Registry {
    /// Validate `variants` and build the lookup table.
    pub fn build(variants: &[Variant]) -> std::result::Result<Self, String> {
        let mut by_tag = HashMap::with_capacity(variants.len());
        for v in variants {
            if v.tag & TOMBSTONE_BIT != 0 {
                return Err(format!("{} uses the reserved tombstone bit", v.name));
            }
            if v.size % BLOCK_SIZE != 0 {
                return Err(format!(
                    "{} size {} is not a multiple of {BLOCK_SIZE}",
                    v.name, v.size
                ));
            }
            if v.size < SELF_START + CHECK_LEN {
                return Err(format!("{} size {} is too small", v.name, v.size));
            }
            if let Some(prev) = by_tag.insert(v.tag, *v) {
                return Err(format!(
                    "{} and {} share tag {}",
                    prev.name, v.name, v.tag
                ));
            }
        }
        Ok(Self { by_tag })
    }

    /// Look up a variant by its tag (tombstone bit already stripped).
    pub fn lookup(&self, tag: u32) -> Option<&Variant> {
        self.by_tag.get(&tag)
    }
}

static REGISTRY: OnceLock<std::result::Result<Registry, String>> = OnceLock::new();

/// The process-wide registry of built-in record types.
pub fn registry() -> Result<&'static Registry> {
    REGISTRY
        .get_or_init(|| Registry::build(&[Variant::of::<AccountData>(), Variant::of::<FolderData>()]))
        .as_ref()
        .map_err(|e| SecureDataError::state(format!("record registry: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::layout::{ACCOUNT_SIZE, ACCOUNT_TAG, FOLDER_SIZE, FOLDER_TAG};

    fn variant(tag: u32, size: usize) -> Variant {
        Variant {
            tag,
            size,
            name: "test",
            empty: FolderData::empty,
        }
    }

    #[test]
    fn builtin_registry_is_valid() {
        let reg = registry().unwrap();
        assert_eq!(reg.lookup(ACCOUNT_TAG).unwrap().size, ACCOUNT_SIZE);
        assert_eq!(reg.lookup(FOLDER_TAG).unwrap().size, FOLDER_SIZE);
        assert!(reg.lookup(99).is_none());
    }

    #[test]
    fn rejects_duplicate_tags() {
        let err = Registry::build(&[variant(7, 464), variant(7, 480)]).unwrap_err();
        assert!(err.contains("share tag 7"));
    }

    #[test]
    fn rejects_misaligned_size() {
        assert!(Registry::build(&[variant(7, 465)]).is_err());
    }

    #[test]
    fn rejects_tombstone_bit_in_tag() {
        assert!(Registry::build(&[variant(TOMBSTONE_BIT | 3, 464)]).is_err());
    }
}
