//! In-memory index of live records.
//!
//! Records live in one table keyed by id; parent and child links are ids
//! resolved through the table. The index is filled in two phases because
//! a parent may be stored after its children: a raw bulk insert during
//! the file scan, then a single hierarchy pass in [`Index::finish_init`].

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::layer::LayerCipher;
use crate::errors::{Result, SecureDataError};

use super::record::Record;

/// Default number of cached sensitive regions.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

struct Entry {
    record: Record,
    file_pos: u64,
}

/// Id -> (record, file offset) table plus the forest built on top of it.
pub struct Index {
    entries: BTreeMap<u32, Entry>,
    roots: Vec<u32>,
    /// Stored (master-encrypted) bytes of sensitive regions.
    cache: LruCache<u32, Zeroizing<Vec<u8>>>,
    initialized: bool,
}

impl Index {
    pub fn new(cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: BTreeMap::new(),
            roots: Vec::new(),
            cache: LruCache::new(capacity),
            initialized: false,
        }
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    /// Raw insert during the initial scan.
    pub(crate) fn add_on_init(&mut self, record: Record, file_pos: u64) -> Result<()> {
        let id = record.id();
        if self.entries.contains_key(&id) {
            return Err(SecureDataError::corrupted(format!(
                "record id {id} appears twice"
            )));
        }
        self.entries.insert(id, Entry { record, file_pos });
        Ok(())
    }

    /// Link every record to its parent, build the root list and set the
    /// initial layer counts (every encrypted record starts locked).
    pub(crate) fn finish_init(&mut self) -> Result<()> {
        if self.initialized {
            return Err(SecureDataError::state("index is already initialized"));
        }
        self.organize_hierarchy()?;

        let ids: Vec<u32> = self.entries.keys().copied().collect();
        for id in ids {
            let layers = self.count_encrypted_ancestors(id)?;
            let record = self.record_mut(id)?;
            record.set_layers(layers, layers);
            record.refresh()?;
        }

        self.initialized = true;
        debug!(
            records = self.entries.len(),
            roots = self.roots.len(),
            "index assembled"
        );
        Ok(())
    }

    fn organize_hierarchy(&mut self) -> Result<()> {
        let links: Vec<(u32, u32)> = self
            .entries
            .values()
            .map(|e| (e.record.id(), e.record.parent_id()))
            .collect();

        for (id, parent_id) in links {
            if parent_id == 0 {
                self.roots.push(id);
                continue;
            }
            let parent = self
                .entries
                .get_mut(&parent_id)
                .map(|e| &mut e.record)
                .ok_or_else(|| {
                    SecureDataError::corrupted(format!(
                        "record {id} refers to missing parent {parent_id}"
                    ))
                })?;
            if !parent.is_folder() {
                return Err(SecureDataError::corrupted(format!(
                    "record {id} has parent {parent_id}, which is not a folder"
                )));
            }
            parent.add_child(id);
        }
        Ok(())
    }

    fn count_encrypted_ancestors(&self, id: u32) -> Result<u32> {
        let mut layers = 0;
        let mut steps = 0usize;
        let mut current = self.record(id)?.parent_id();
        while current != 0 {
            let parent = self.record(current)?;
            if parent.is_encrypted() {
                layers += 1;
            }
            steps += 1;
            if steps > self.entries.len() {
                return Err(SecureDataError::corrupted(format!(
                    "parent chain of record {id} forms a cycle"
                )));
            }
            current = parent.parent_id();
        }
        Ok(layers)
    }

    /// Insert a freshly appended record and link it to its parent.
    pub(crate) fn add(&mut self, record: Record, file_pos: u64) -> Result<()> {
        if !self.initialized {
            return Err(SecureDataError::state("index is not initialized"));
        }
        let id = record.id();
        let parent_id = record.parent_id();
        if self.entries.contains_key(&id) {
            return Err(SecureDataError::state(format!(
                "record {id} is already indexed"
            )));
        }
        if parent_id != 0 {
            let parent = self.record(parent_id)?;
            if !parent.is_folder() {
                return Err(SecureDataError::state(format!(
                    "record {parent_id} is not a folder"
                )));
            }
        }
        self.entries.insert(id, Entry { record, file_pos });
        self.link(id, parent_id)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn record(&self, id: u32) -> Result<&Record> {
        self.entries
            .get(&id)
            .map(|e| &e.record)
            .ok_or(SecureDataError::NotFound(id))
    }

    pub(crate) fn record_mut(&mut self, id: u32) -> Result<&mut Record> {
        self.entries
            .get_mut(&id)
            .map(|e| &mut e.record)
            .ok_or(SecureDataError::NotFound(id))
    }

    pub fn file_pos(&self, id: u32) -> Result<u64> {
        self.entries
            .get(&id)
            .map(|e| e.file_pos)
            .ok_or(SecureDataError::NotFound(id))
    }

    /// Root-level ids in ascending order.
    pub fn roots(&self) -> &[u32] {
        &self.roots
    }

    /// Every id in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: u32) -> Result<Vec<u32>> {
        let mut chain = Vec::new();
        let mut current = self.record(id)?.parent_id();
        while current != 0 {
            if chain.len() > self.entries.len() {
                return Err(SecureDataError::corrupted(format!(
                    "parent chain of record {id} forms a cycle"
                )));
            }
            chain.push(current);
            current = self.record(current)?.parent_id();
        }
        Ok(chain)
    }

    /// Every descendant of `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: u32) -> Result<Vec<u32>> {
        let mut out = Vec::new();
        let mut stack: Vec<u32> = self.record(id)?.children().iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.record(next)?.children().iter().rev().copied());
        }
        Ok(out)
    }

    /// Wide-stream ciphers of the encrypted records in `ids`, which must
    /// all be unlocked.
    pub(crate) fn encrypted_chain(&self, ids: &[u32]) -> Result<Vec<LayerCipher>> {
        let mut chain = Vec::new();
        for &id in ids {
            let record = self.record(id)?;
            if !record.is_encrypted() {
                continue;
            }
            let cipher = record.layer_cipher().ok_or_else(|| {
                SecureDataError::state(format!("folder {id} is locked"))
            })?;
            chain.push(cipher.clone());
        }
        Ok(chain)
    }

    // ------------------------------------------------------------------
    // Cascades
    // ------------------------------------------------------------------

    /// Strip `id`'s freshly unlocked layer from every descendant.
    pub(crate) fn unlock_cascade(&mut self, id: u32) -> Result<()> {
        let cipher = self
            .record(id)?
            .layer_cipher()
            .cloned()
            .ok_or_else(|| SecureDataError::state(format!("record {id} is not unlocked")))?;
        for child in self.descendants(id)? {
            self.record_mut(child)?.unlock_layer(&cipher)?;
        }
        Ok(())
    }

    /// Re-apply `cipher` (the layer of `id`, just locked) to every descendant.
    pub(crate) fn lock_cascade(&mut self, id: u32, cipher: &LayerCipher) -> Result<()> {
        for child in self.descendants(id)? {
            self.record_mut(child)?.lock_layer(cipher)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Swap in an edited copy of a record, relinking it if it moved.
    pub(crate) fn replace(&mut self, record: Record) -> Result<()> {
        let id = record.id();
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(SecureDataError::NotFound(id))?;
        let old_parent = entry.record.parent_id();
        let new_parent = record.parent_id();
        entry.record = record;
        if old_parent != new_parent {
            self.unlink(id, old_parent);
            self.link(id, new_parent)?;
        }
        self.cache.pop(&id);
        Ok(())
    }

    /// Remove `id` and its whole subtree. Returns the removed ids.
    pub(crate) fn remove_subtree(&mut self, id: u32) -> Result<Vec<u32>> {
        let mut removed = vec![id];
        removed.extend(self.descendants(id)?);
        let parent_id = self.record(id)?.parent_id();
        self.unlink(id, parent_id);
        for gone in &removed {
            self.entries.remove(gone);
            self.cache.pop(gone);
        }
        Ok(removed)
    }

    fn link(&mut self, id: u32, parent_id: u32) -> Result<()> {
        if parent_id == 0 {
            if let Err(pos) = self.roots.binary_search(&id) {
                self.roots.insert(pos, id);
            }
        } else {
            self.record_mut(parent_id)?.add_child(id);
        }
        Ok(())
    }

    fn unlink(&mut self, id: u32, parent_id: u32) {
        if parent_id == 0 {
            self.roots.retain(|&r| r != id);
        } else if let Some(parent) = self.entries.get_mut(&parent_id) {
            parent.record.remove_child(id);
        }
    }

    // ------------------------------------------------------------------
    // Sensitive-region cache
    // ------------------------------------------------------------------

    pub(crate) fn cached_sensitive(&mut self, id: u32) -> Option<Zeroizing<Vec<u8>>> {
        self.cache.get(&id).cloned()
    }

    pub(crate) fn cache_sensitive(&mut self, id: u32, bytes: Zeroizing<Vec<u8>>) {
        self.cache.put(id, bytes);
    }

    pub(crate) fn invalidate(&mut self, id: u32) {
        self.cache.pop(&id);
    }

    pub fn is_cached(&self, id: u32) -> bool {
        self.cache.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record::{Decoded, Record};

    const NOW: i64 = 1_700_000_000_000;

    fn stored(mut record: Record, id: u32, parent: u32) -> Record {
        record.set_parent(parent).unwrap();
        record.finish_init(id, NOW).unwrap();
        let bytes = record.flush(&[]).unwrap();
        match Record::try_decode(&bytes).unwrap() {
            Decoded::Record { record, .. } => record,
            _ => panic!("expected a live record"),
        }
    }

    fn folder(id: u32, parent: u32) -> Record {
        stored(Record::folder("f").unwrap(), id, parent)
    }

    fn account(id: u32, parent: u32) -> Record {
        stored(Record::account("a").unwrap(), id, parent)
    }

    #[test]
    fn children_before_parents_are_linked() {
        let mut index = Index::new(4);
        index.add_on_init(account(3, 1), 0).unwrap();
        index.add_on_init(folder(2, 1), 0).unwrap();
        index.add_on_init(folder(1, 0), 0).unwrap();
        index.finish_init().unwrap();

        assert_eq!(index.roots(), &[1]);
        assert_eq!(index.record(1).unwrap().children(), &[2, 3]);
        assert_eq!(index.descendants(1).unwrap(), vec![2, 3]);
        assert_eq!(index.ancestors(3).unwrap(), vec![1]);
        assert!(index.record(3).unwrap().is_visible());
        assert!(index.finish_init().is_err());
    }

    #[test]
    fn dangling_parent_is_corruption() {
        let mut index = Index::new(4);
        index.add_on_init(account(2, 9), 0).unwrap();
        assert!(matches!(
            index.finish_init(),
            Err(SecureDataError::Corrupted(_))
        ));
    }

    #[test]
    fn account_parent_is_corruption() {
        let mut index = Index::new(4);
        index.add_on_init(account(1, 0), 0).unwrap();
        index.add_on_init(account(2, 1), 0).unwrap();
        assert!(index.finish_init().is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut index = Index::new(4);
        index.add_on_init(folder(1, 0), 0).unwrap();
        assert!(index.add_on_init(folder(1, 0), 16).is_err());

        let mut index = Index::new(4);
        index.finish_init().unwrap();
        index.add(folder(1, 0), 0).unwrap();
        assert!(matches!(
            index.add(folder(1, 0), 0),
            Err(SecureDataError::InvalidState(_))
        ));
    }

    #[test]
    fn remove_subtree_unlinks_everything() {
        let mut index = Index::new(4);
        for r in [folder(1, 0), folder(2, 1), account(3, 2), account(4, 0)] {
            index.add_on_init(r, 0).unwrap();
        }
        index.finish_init().unwrap();
        index.cache_sensitive(3, Zeroizing::new(vec![0u8; 16]));

        let removed = index.remove_subtree(1).unwrap();
        assert_eq!(removed, vec![1, 2, 3]);
        assert_eq!(index.roots(), &[4]);
        assert_eq!(index.len(), 1);
        assert!(!index.is_cached(3));
    }

    #[test]
    fn cycles_are_corruption() {
        let mut index = Index::new(4);
        index.add_on_init(folder(1, 2), 0).unwrap();
        index.add_on_init(folder(2, 1), 0).unwrap();
        assert!(matches!(
            index.finish_init(),
            Err(SecureDataError::Corrupted(_))
        ));
    }

    #[test]
    fn cache_is_bounded() {
        let mut index = Index::new(2);
        for id in 1..=3 {
            index.cache_sensitive(id, Zeroizing::new(vec![id as u8; 16]));
        }
        assert!(!index.is_cached(1));
        assert_eq!(index.cached_sensitive(3).unwrap()[0], 3);
    }
}
