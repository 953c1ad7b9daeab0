//! The store: one file, one master key, one integrity chain.
//!
//! `DataBase` owns the file handle and routes every operation through
//! the index. The file is a clear 128-byte header followed by records
//! encrypted with the master key stream. Every mutating operation writes
//! the affected records first and the header tag last; the in-memory
//! state only moves forward once the disk writes succeeded.
//!
//! ```no_run
//! use securedata::crypto::KdfParams;
//! use securedata::store::{DataBase, Record};
//!
//! # fn main() -> securedata::errors::Result<()> {
//! let mut db = DataBase::open(std::path::Path::new("secure.sdb"))?;
//! db.create("alice", b"p1", KdfParams::default())?;
//! let work = db.add_data(Record::folder("Work")?)?;
//! let mut gmail = Record::account("gmail")?;
//! gmail.set_login("a@x.com")?;
//! gmail.set_password("secret")?;
//! gmail.set_parent(work)?;
//! db.add_data(gmail)?;
//! # Ok(())
//! # }
//! ```

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::cipher::{AesCtr, BLOCK_SIZE};
use crate::crypto::hash::IntegrityChain;
use crate::crypto::kdf::{derive_key, generate_salt, KdfParams, SALT_LEN};
use crate::crypto::keys::SecretKey;
use crate::crypto::layer::LayerCipher;
use crate::errors::{Result, SecureDataError};

use super::index::{Index, DEFAULT_CACHE_CAPACITY};
use super::layout::*;
use super::record::{self, Decoded, Record};

/// Bytes read per step while hashing or scanning the file.
const SCAN_CHUNK: usize = 4096;

/// Key material of an opened store.
struct Session {
    cipher: AesCtr,
    integrity_key: SecretKey,
    /// HMAC over file bytes `[32, EOF)`.
    chain: IntegrityChain,
}

/// An encrypted single-file store of accounts and folders.
pub struct DataBase {
    path: PathBuf,
    file: File,
    kdf: KdfParams,
    version: u32,
    salt: [u8; SALT_LEN],
    login: String,
    session: Option<Session>,
    index: Index,
    cache_capacity: usize,
    next_id: u32,
    end: u64,
}

impl DataBase {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open (or create empty) the file at `path`.
    ///
    /// The store is unusable until [`DataBase::create`] or
    /// [`DataBase::try_init`] succeeds.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_cache(path, DEFAULT_CACHE_CAPACITY)
    }

    /// Like [`DataBase::open`] with an explicit sensitive-cache size.
    pub fn open_with_cache(path: &Path, cache_capacity: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        // Set restrictive permissions on the store file (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(path, perms);
        }

        let end = file.metadata()?.len();
        debug!(path = %path.display(), len = end, "opened store file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            kdf: KdfParams::default(),
            version: FORMAT_VERSION,
            salt: [0u8; SALT_LEN],
            login: String::new(),
            session: None,
            index: Index::new(cache_capacity),
            cache_capacity,
            next_id: 1,
            end,
        })
    }

    /// Initialize an empty file as a new store.
    pub fn create(&mut self, login: &str, password: &[u8], kdf: KdfParams) -> Result<()> {
        if self.session.is_some() {
            return Err(SecureDataError::state("store is already initialized"));
        }
        if self.file.metadata()?.len() != 0 {
            return Err(SecureDataError::StoreAlreadyExists(self.path.clone()));
        }

        // 1. Random salt, master key.
        let salt = generate_salt();
        let master = derive_key(password, &salt, &kdf)?;

        // 2. Header fields.
        let mut header = [0u8; HEADER_LEN];
        kdf.encode(&mut header[HEADER_KDF_OFFSET..HEADER_VERSION_OFFSET]);
        write_u32(&mut header, HEADER_VERSION_OFFSET, FORMAT_VERSION);
        header[HEADER_SALT_OFFSET..HEADER_LOGIN_OFFSET].copy_from_slice(&salt);
        write_str(
            &mut header,
            HEADER_LOGIN_OFFSET,
            HEADER_LOGIN_LEN,
            "login",
            login,
        )?;

        // 3. Tag over everything after the tag itself.
        let integrity_key = master.derive_integrity_key()?;
        let mut chain = IntegrityChain::new(&integrity_key)?;
        chain.update(&header[HASH_LEN..]);
        header[..HASH_LEN].copy_from_slice(&chain.snapshot());

        // 4. Persist, then switch state.
        self.write_at(0, &header)?;
        self.file.sync_data()?;

        self.session = Some(Session {
            cipher: AesCtr::new(master.as_bytes(), &salt)?,
            integrity_key,
            chain,
        });
        self.kdf = kdf;
        self.version = FORMAT_VERSION;
        self.salt = salt;
        self.login = login.to_owned();
        self.end = HEADER_LEN as u64;
        self.next_id = 1;
        self.index = Index::new(self.cache_capacity);
        self.index.finish_init()?;

        info!(path = %self.path.display(), "created store");
        Ok(())
    }

    /// Open the store with `password`.
    ///
    /// Returns `Ok(false)` when the whole-file tag does not match, which
    /// means a wrong password or a damaged file; nothing is indexed then.
    pub fn try_init(&mut self, password: &[u8]) -> Result<bool> {
        if self.session.is_some() {
            return Err(SecureDataError::state("store is already initialized"));
        }

        let len = self.file.metadata()?.len();
        if len < HEADER_LEN as u64 {
            return Err(SecureDataError::corrupted(format!(
                "file is {len} bytes, shorter than the {HEADER_LEN}-byte header"
            )));
        }
        if (len - HEADER_LEN as u64) % BLOCK_SIZE as u64 != 0 {
            return Err(SecureDataError::corrupted(format!(
                "data region of {} bytes is not block aligned",
                len - HEADER_LEN as u64
            )));
        }

        // 1. Header.
        let mut header = [0u8; HEADER_LEN];
        self.read_exact_at(0, &mut header)?;
        let version = read_u32(&header, HEADER_VERSION_OFFSET);
        if version != FORMAT_VERSION {
            return Err(SecureDataError::VersionMismatch {
                found: version,
                expected: FORMAT_VERSION,
            });
        }
        let kdf = KdfParams::decode(&header[HEADER_KDF_OFFSET..HEADER_VERSION_OFFSET])?;
        let salt = read_salt(&header, HEADER_SALT_OFFSET);

        // 2. Keys, then the whole-file tag before trusting any record.
        let master = derive_key(password, &salt, &kdf)?;
        let integrity_key = master.derive_integrity_key()?;
        let chain = self.hash_file(&integrity_key, len)?;
        if !chain.matches(&header[..HASH_LEN]) {
            warn!(path = %self.path.display(), "store tag mismatch: wrong password or corrupted file");
            return Ok(false);
        }

        // 3. Scan the data region, then assemble the forest.
        let cipher = AesCtr::new(master.as_bytes(), &salt)?;
        let mut index = Index::new(self.cache_capacity);
        let max_id = self.scan(&cipher, len, &mut index)?;
        index.finish_init()?;
        let login = read_str(&header, HEADER_LOGIN_OFFSET, HEADER_LOGIN_LEN, "login")?;

        self.session = Some(Session {
            cipher,
            integrity_key,
            chain,
        });
        self.kdf = kdf;
        self.version = version;
        self.salt = salt;
        self.login = login;
        self.index = index;
        self.end = len;
        self.next_id = max_id
            .checked_add(1)
            .ok_or_else(|| SecureDataError::corrupted("record ids exhausted"))?;

        info!(
            path = %self.path.display(),
            records = self.index.len(),
            "opened store"
        );
        Ok(true)
    }

    /// Flush the file to disk and drop all key material.
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Append a new record. Returns its assigned id.
    ///
    /// The parent folder (if any) must be visible and, when encrypted,
    /// unlocked: its key stream becomes one of the record's layers.
    pub fn add_data(&mut self, mut record: Record) -> Result<u32> {
        self.session()?;
        if record.id() != 0 && self.index.contains(record.id()) {
            return Err(SecureDataError::state(format!(
                "record {} is already indexed",
                record.id()
            )));
        }

        let chain = self.chain_under(record.parent_id())?;
        let id = self.next_id;
        record.finish_init(id, now_ms())?;
        record.set_layers(layer_count(&chain), 0);
        let stored = record.flush(&chain)?;

        let pos = self.end;
        let written = self.write_stored(pos, &stored)?;
        let mut chain_after = self.session()?.chain.clone();
        chain_after.update(&written);
        self.commit_tag(chain_after)?;

        self.end = pos + stored.len() as u64;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| SecureDataError::state("record ids exhausted"))?;
        let kind = record.kind();
        self.index.add(record, pos)?;

        debug!(id, pos, %kind, "appended record");
        Ok(id)
    }

    /// Bring the sensitive region of an account into memory.
    ///
    /// No-op for folders and for already loaded records. Requires every
    /// encrypted ancestor to be unlocked.
    pub fn load_sensitive(&mut self, id: u32) -> Result<()> {
        self.session()?;
        let record = self.index.record(id)?;
        let Some(range) = record.sensitive_range() else {
            return Ok(());
        };
        if record.is_loaded() {
            return Ok(());
        }
        if !record.is_visible() {
            return Err(SecureDataError::state(format!(
                "cannot load record {id}: enclosing folder locked"
            )));
        }

        let pos = self.index.file_pos(id)? + range.start as u64;
        let mut bytes = match self.index.cached_sensitive(id) {
            Some(cached) => cached,
            None => {
                let mut fresh = Zeroizing::new(vec![0u8; range.len()]);
                self.read_exact_at(pos, &mut fresh)?;
                self.index.cache_sensitive(id, fresh.clone());
                fresh
            }
        };
        self.session()?
            .cipher
            .transform_at(&mut bytes, block_counter(pos)?)?;

        let ancestors = self.index.ancestors(id)?;
        let chain = self.index.encrypted_chain(&ancestors)?;
        self.index.record_mut(id)?.absorb_sensitive(&bytes, &chain)?;

        debug!(id, "loaded sensitive region");
        Ok(())
    }

    /// Edit a record in place.
    ///
    /// `edit` runs on a copy; nothing changes if it fails. Returns
    /// `Ok(false)` when the edit changed nothing. Switching encryption on
    /// or off, or moving the record, reseals every descendant on disk.
    pub fn modify_data<F>(&mut self, id: u32, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut Record) -> Result<()>,
    {
        self.session()?;
        self.load_sensitive(id)?;

        let current = self.index.record(id)?;
        if !current.is_visible() {
            return Err(SecureDataError::state(format!(
                "cannot edit record {id}: enclosing folder locked"
            )));
        }
        if current.is_self_locked() {
            return Err(SecureDataError::state(format!(
                "record {id} is locked; unlock it before editing"
            )));
        }
        let old_cipher = current.layer_cipher().cloned();
        let old_parent = current.parent_id();
        let mut draft = current.clone();

        draft.unfreeze()?;
        edit(&mut draft)?;
        draft.freeze(now_ms())?;
        let layer_changed = draft.take_layer_change();
        if draft.changes() == 0 {
            return Ok(false);
        }

        // 1. Where does the record live now?
        let new_parent = draft.parent_id();
        let moved = new_parent != old_parent;
        let ancestors = self.index.ancestors(id)?;
        let old_chain = self.index.encrypted_chain(&ancestors)?;
        let new_chain = if moved {
            self.check_move(id, new_parent)?;
            self.chain_under(new_parent)?
        } else {
            old_chain.clone()
        };

        // 2. Rewrite the record itself.
        draft.set_layers(layer_count(&new_chain), 0);
        let stored = draft.flush(&new_chain)?;
        let pos = self.index.file_pos(id)?;
        self.write_stored(pos, &stored)?;

        // 3. Reseal descendants whose layer stack changed.
        let mut strip: Vec<LayerCipher> = Vec::new();
        let mut add: Vec<LayerCipher> = Vec::new();
        if moved {
            strip.extend(old_chain.iter().cloned());
            add.extend(new_chain.iter().cloned());
        }
        if layer_changed {
            strip.extend(old_cipher);
            add.extend(draft.layer_cipher().cloned());
        }
        let mut resealed = Vec::new();
        if !strip.is_empty() || !add.is_empty() {
            for child in self.index.descendants(id)? {
                let hash = self.reseal(child, &strip, &add)?;
                resealed.push((child, hash));
            }
        }

        // 4. Tag over the whole file.
        self.refresh_tag()?;

        // 5. Commit in memory.
        self.index.replace(draft)?;
        for (child, hash) in resealed {
            let record = self.index.record_mut(child)?;
            let layers = (i64::from(record.parent_layers()) - strip.len() as i64
                + add.len() as i64)
                .max(0);
            let locked = record.locked_layers();
            record.set_layers(u32::try_from(layers).unwrap_or(u32::MAX), locked);
            record.set_hash(&hash);
            self.index.invalidate(child);
        }

        debug!(id, moved, layer_changed, "modified record");
        Ok(true)
    }

    /// Tombstone a record and, for a folder, every descendant.
    ///
    /// Returns how many records were removed.
    pub fn delete_data(&mut self, id: u32) -> Result<usize> {
        self.session()?;
        if !self.index.record(id)?.is_visible() {
            return Err(SecureDataError::state(format!(
                "cannot delete record {id}: enclosing folder locked"
            )));
        }

        let mut targets = vec![id];
        targets.extend(self.index.descendants(id)?);
        for &target in &targets {
            let pos = self.index.file_pos(target)?;
            let size = self.index.record(target)?.kind().size();
            let mut stored = self.read_stored(pos, size)?;
            if !record::hash_matches(&stored) {
                return Err(SecureDataError::IntegrityFailure { id: target });
            }
            let tag = read_u32(&stored, TAG_OFFSET) | TOMBSTONE_BIT;
            write_u32(&mut stored, TAG_OFFSET, tag);
            record::rehash(&mut stored);
            self.write_stored(pos, &stored)?;
        }
        self.refresh_tag()?;

        let removed = self.index.remove_subtree(id)?;
        info!(id, removed = removed.len(), "deleted record");
        Ok(removed.len())
    }

    /// Unlock an encrypted record with its item key.
    ///
    /// A wrong key returns `Ok(false)` and leaves the record as it was.
    /// Unlocking a folder makes its descendants readable.
    pub fn try_unlock(&mut self, id: u32, key: &SecretKey) -> Result<bool> {
        self.session()?;
        self.load_sensitive(id)?;
        if !self.index.record_mut(id)?.try_unlock(key)? {
            debug!(id, "item key rejected");
            return Ok(false);
        }
        if self.index.record(id)?.is_folder() {
            self.index.unlock_cascade(id)?;
        }
        debug!(id, "record unlocked");
        Ok(true)
    }

    /// Lock an unlocked record again (and, for a folder, its subtree).
    pub fn lock(&mut self, id: u32) -> Result<()> {
        self.session()?;
        let cipher = self.index.record_mut(id)?.lock()?;
        if self.index.record(id)?.is_folder() {
            self.index.lock_cascade(id, &cipher)?;
        }
        debug!(id, "record locked");
        Ok(())
    }

    /// Derive an item key from `passphrase` and the record's salt using
    /// the store's KDF parameters.
    pub fn derive_item_key(&self, passphrase: &[u8], record: &Record) -> Result<SecretKey> {
        derive_key(passphrase, record.salt()?, &self.kdf)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get(&self, id: u32) -> Result<&Record> {
        self.index.record(id)
    }

    /// Root-level records in id order.
    pub fn root(&self) -> Vec<&Record> {
        self.index
            .roots()
            .iter()
            .filter_map(|&id| self.index.record(id).ok())
            .collect()
    }

    /// Direct children of folder `id` in id order.
    pub fn children(&self, id: u32) -> Result<Vec<&Record>> {
        self.index
            .record(id)?
            .children()
            .iter()
            .map(|&child| self.index.record(child))
            .collect()
    }

    /// Every descendant id of `id`, pre-order.
    pub fn descendants(&self, id: u32) -> Result<Vec<u32>> {
        self.index.descendants(id)
    }

    /// Ids from the root down to `id` (inclusive).
    pub fn path(&self, id: u32) -> Result<Vec<u32>> {
        let mut path = self.index.ancestors(id)?;
        path.reverse();
        path.push(id);
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Whether `create` or `try_init` has succeeded.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn kdf_params(&self) -> &KdfParams {
        &self.kdf
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| SecureDataError::state("store is not open"))
    }

    /// Layers a new child of `parent_id` must carry.
    fn chain_under(&self, parent_id: u32) -> Result<Vec<LayerCipher>> {
        if parent_id == 0 {
            return Ok(Vec::new());
        }
        let parent = self.index.record(parent_id)?;
        if !parent.is_folder() {
            return Err(SecureDataError::state(format!(
                "record {parent_id} is not a folder"
            )));
        }
        if !parent.is_visible() || parent.is_self_locked() {
            return Err(SecureDataError::state(format!(
                "folder {parent_id} is locked"
            )));
        }
        let mut ids = vec![parent_id];
        ids.extend(self.index.ancestors(parent_id)?);
        self.index.encrypted_chain(&ids)
    }

    fn check_move(&self, id: u32, new_parent: u32) -> Result<()> {
        if new_parent == 0 {
            return Ok(());
        }
        if new_parent == id || self.index.descendants(id)?.contains(&new_parent) {
            return Err(SecureDataError::state(format!(
                "cannot move record {id} into its own subtree"
            )));
        }
        Ok(())
    }

    /// Strip and add wide layers on a descendant's stored bytes.
    fn reseal(
        &mut self,
        id: u32,
        strip: &[LayerCipher],
        add: &[LayerCipher],
    ) -> Result<[u8; HASH_LEN]> {
        let pos = self.index.file_pos(id)?;
        let size = self.index.record(id)?.kind().size();
        let mut stored = self.read_stored(pos, size)?;
        if !record::hash_matches(&stored) {
            return Err(SecureDataError::IntegrityFailure { id });
        }
        for layer in strip.iter().chain(add) {
            record::apply_wide(&mut stored, id, layer)?;
        }
        record::rehash(&mut stored);
        self.write_stored(pos, &stored)?;

        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&stored[..HASH_LEN]);
        Ok(hash)
    }

    /// Walk the data region, decoding records from growing windows.
    /// Returns the highest id seen, tombstones included.
    fn scan(&mut self, cipher: &AesCtr, len: u64, index: &mut Index) -> Result<u32> {
        let mut max_id = 0u32;
        let mut pending: Zeroizing<Vec<u8>> = Zeroizing::new(Vec::with_capacity(2 * SCAN_CHUNK));
        let mut pending_pos = HEADER_LEN as u64;
        let mut read_pos = HEADER_LEN as u64;
        let mut chunk = Zeroizing::new(vec![0u8; SCAN_CHUNK]);
        self.file.seek(SeekFrom::Start(read_pos))?;

        loop {
            let mut offset = 0usize;
            loop {
                match Record::try_decode(&pending[offset..])? {
                    Decoded::NeedMoreBytes => break,
                    Decoded::Tombstoned { id, consumed } => {
                        max_id = max_id.max(id);
                        offset += consumed;
                    }
                    Decoded::Record { record, consumed } => {
                        max_id = max_id.max(record.id());
                        index.add_on_init(record, pending_pos + offset as u64)?;
                        offset += consumed;
                    }
                }
            }
            if offset > 0 {
                let keep = pending.len() - offset;
                pending.copy_within(offset.., 0);
                pending[keep..].zeroize();
                pending.truncate(keep);
                pending_pos += offset as u64;
            }

            if read_pos >= len {
                break;
            }
            let n = usize::try_from((len - read_pos).min(SCAN_CHUNK as u64)).unwrap_or(SCAN_CHUNK);
            self.file.read_exact(&mut chunk[..n])?;
            cipher.transform_at(&mut chunk[..n], block_counter(read_pos)?)?;
            pending.extend_from_slice(&chunk[..n]);
            read_pos += n as u64;
        }

        if !pending.is_empty() {
            return Err(SecureDataError::corrupted(format!(
                "file ends inside the record at offset {pending_pos}"
            )));
        }
        Ok(max_id)
    }

    /// HMAC over the file bytes `[32, len)`.
    fn hash_file(&mut self, key: &SecretKey, len: u64) -> Result<IntegrityChain> {
        let mut chain = IntegrityChain::new(key)?;
        self.file.seek(SeekFrom::Start(HASH_LEN as u64))?;
        let mut remaining = len.saturating_sub(HASH_LEN as u64);
        let mut buf = vec![0u8; SCAN_CHUNK];
        while remaining > 0 {
            let n = usize::try_from(remaining.min(SCAN_CHUNK as u64)).unwrap_or(SCAN_CHUNK);
            self.file.read_exact(&mut buf[..n])?;
            chain.update(&buf[..n]);
            remaining -= n as u64;
        }
        Ok(chain)
    }

    /// Recompute the tag from scratch after an in-place rewrite.
    fn refresh_tag(&mut self) -> Result<()> {
        let key = self.session()?.integrity_key.clone();
        let chain = self.hash_file(&key, self.end)?;
        self.commit_tag(chain)
    }

    /// Write the tag of `chain` into the header, then adopt `chain`.
    fn commit_tag(&mut self, chain: IntegrityChain) -> Result<()> {
        let tag = chain.snapshot();
        self.write_at(0, &tag)?;
        self.file.sync_data()?;
        if let Some(session) = self.session.as_mut() {
            session.chain = chain;
        }
        Ok(())
    }

    /// Read and master-decrypt `len` stored bytes at `pos`.
    fn read_stored(&mut self, pos: u64, len: usize) -> Result<Zeroizing<Vec<u8>>> {
        let mut buf = Zeroizing::new(vec![0u8; len]);
        self.read_exact_at(pos, &mut buf)?;
        self.session()?
            .cipher
            .transform_at(&mut buf, block_counter(pos)?)?;
        Ok(buf)
    }

    /// Master-encrypt `stored` and write it at `pos`. Returns the bytes
    /// as written.
    fn write_stored(&mut self, pos: u64, stored: &[u8]) -> Result<Vec<u8>> {
        let mut buf = stored.to_vec();
        self.session()?
            .cipher
            .transform_at(&mut buf, block_counter(pos)?)?;
        self.write_at(pos, &buf)?;
        Ok(buf)
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, pos: u64, buf: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_all(buf)?;
        Ok(())
    }
}

impl Drop for DataBase {
    fn drop(&mut self) {
        self.salt.zeroize();
    }
}

/// Master-stream block counter of file offset `pos`.
fn block_counter(pos: u64) -> Result<u32> {
    let offset = pos
        .checked_sub(HEADER_LEN as u64)
        .ok_or_else(|| SecureDataError::state(format!("offset {pos} is inside the header")))?;
    u32::try_from(offset / BLOCK_SIZE as u64)
        .map_err(|_| SecureDataError::corrupted("store exceeds the addressable size"))
}

fn layer_count(chain: &[LayerCipher]) -> u32 {
    u32::try_from(chain.len()).unwrap_or(u32::MAX)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
