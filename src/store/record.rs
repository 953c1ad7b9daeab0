//! One stored item: codec, change tracking and the lock state machine.
//!
//! A record keeps its bytes in `raw`, which always equals the stored
//! bytes with the key streams of every currently unlocked layer removed.
//! Because every layer is a CTR keystream, layers can be removed and
//! re-applied in any order. Parsed fields are only resident while the
//! bytes under them are plaintext:
//!
//! - public fields (name, description, timestamps, salt) need every
//!   encrypted ancestor unlocked (`locked_layers == 0`);
//! - account credentials additionally need the sensitive region loaded
//!   and, for an encrypted record, the record's own key.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::hash::{ct_eq, digest, digest_parts};
use crate::crypto::kdf::{fill_random, generate_salt, SALT_LEN};
use crate::crypto::keys::SecretKey;
use crate::crypto::layer::LayerCipher;
use crate::errors::{Result, SecureDataError};

use super::layout::*;
use super::registry::{registry, RecordType};

/// Domain separator for the self-region check value.
const SEAL_DOMAIN: &[u8] = b"securedata/seal";

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Record variant discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Account,
    Folder,
}

impl Kind {
    pub fn tag(self) -> u32 {
        match self {
            Kind::Account => AccountData::TAG,
            Kind::Folder => FolderData::TAG,
        }
    }

    pub fn size(self) -> usize {
        match self {
            Kind::Account => AccountData::SIZE,
            Kind::Folder => FolderData::SIZE,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Account => f.write_str(AccountData::NAME),
            Kind::Folder => f.write_str(FolderData::NAME),
        }
    }
}

/// Credentials of an account entry. Wiped on drop.
#[derive(Clone, Default, Zeroize)]
#[zeroize(drop)]
pub struct AccountData {
    login: String,
    password: String,
}

impl RecordType for AccountData {
    const TAG: u32 = ACCOUNT_TAG;
    const SIZE: usize = ACCOUNT_SIZE;
    const NAME: &'static str = "account";

    fn empty() -> Payload {
        Payload::Account(AccountData::default())
    }
}

/// A folder: owns the ids of its direct children.
#[derive(Debug, Clone, Default)]
pub struct FolderData {
    children: Vec<u32>,
}

impl RecordType for FolderData {
    const TAG: u32 = FOLDER_TAG;
    const SIZE: usize = FOLDER_SIZE;
    const NAME: &'static str = "folder";

    fn empty() -> Payload {
        Payload::Folder(FolderData::default())
    }
}

/// Variant-specific part of a record.
#[derive(Clone)]
pub enum Payload {
    Account(AccountData),
    Folder(FolderData),
}

impl Payload {
    fn kind(&self) -> Kind {
        match self {
            Payload::Account(_) => Kind::Account,
            Payload::Folder(_) => Kind::Folder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Built in memory, no id yet. Editable.
    New,
    /// Indexed and consistent with its flushed bytes.
    Immutable,
    /// Being edited inside `modify_data`.
    Mutable,
}

/// Outcome of [`Record::try_decode`].
pub enum Decoded {
    /// The buffer ends before the record does.
    NeedMoreBytes,
    /// A deleted record; skip `consumed` bytes.
    Tombstoned { id: u32, consumed: usize },
    /// A live record occupying the first `consumed` bytes.
    Record { record: Record, consumed: usize },
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One account or folder.
#[derive(Clone)]
pub struct Record {
    payload: Payload,
    id: u32,
    parent_id: u32,
    encrypted: bool,

    created: i64,
    last_edit: i64,
    salt: [u8; SALT_LEN],
    name: String,
    description: String,

    raw: Zeroizing<Vec<u8>>,
    /// Own key stream, present while encrypted and self-unlocked.
    cipher: Option<LayerCipher>,
    parent_layers: u32,
    locked_layers: u32,
    loaded: bool,

    phase: Phase,
    changes: u32,
    layer_changed: bool,
}

impl Record {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    fn new(payload: Payload, name: &str) -> Result<Self> {
        check_str("name", name, NAME_LEN)?;
        let size = payload.kind().size();
        Ok(Self {
            payload,
            id: 0,
            parent_id: 0,
            encrypted: false,
            created: 0,
            last_edit: 0,
            salt: generate_salt(),
            name: name.to_owned(),
            description: String::new(),
            raw: Zeroizing::new(vec![0u8; size]),
            cipher: None,
            parent_layers: 0,
            locked_layers: 0,
            loaded: true,
            phase: Phase::New,
            changes: 1,
            layer_changed: false,
        })
    }

    /// A new, unsaved account entry.
    pub fn account(name: &str) -> Result<Self> {
        Self::new(AccountData::empty(), name)
    }

    /// A new, unsaved folder.
    pub fn folder(name: &str) -> Result<Self> {
        Self::new(FolderData::empty(), name)
    }

    // ------------------------------------------------------------------
    // Clear metadata (always readable)
    // ------------------------------------------------------------------

    /// Store-assigned id; 0 until the record is added.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Id of the enclosing folder, 0 at root level.
    pub fn parent_id(&self) -> u32 {
        self.parent_id
    }

    pub fn kind(&self) -> Kind {
        self.payload.kind()
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.payload, Payload::Folder(_))
    }

    /// Whether the record carries its own encryption layer.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Public fields are readable iff no encrypted ancestor is locked.
    pub fn is_visible(&self) -> bool {
        self.locked_layers == 0
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Encrypted and not unlocked with its own key.
    pub fn is_self_locked(&self) -> bool {
        self.encrypted && self.cipher.is_none()
    }

    /// Setters are accepted only while this is `true`.
    pub fn is_mutable(&self) -> bool {
        matches!(self.phase, Phase::New | Phase::Mutable)
    }

    /// Edits made since the last flush.
    pub fn changes(&self) -> u32 {
        self.changes
    }

    /// Number of encrypted ancestors.
    pub fn parent_layers(&self) -> u32 {
        self.parent_layers
    }

    /// Number of encrypted ancestors currently locked.
    pub fn locked_layers(&self) -> u32 {
        self.locked_layers
    }

    /// Direct children of a folder (empty for accounts).
    pub fn children(&self) -> &[u32] {
        match &self.payload {
            Payload::Folder(folder) => &folder.children,
            Payload::Account(_) => &[],
        }
    }

    /// Digest stored with the record as of its last flush.
    pub fn hash(&self) -> &[u8] {
        &self.raw[..HASH_LEN]
    }

    // ------------------------------------------------------------------
    // Public fields
    // ------------------------------------------------------------------

    pub fn name(&self) -> Result<&str> {
        self.ensure_visible("read the name of")?;
        Ok(&self.name)
    }

    pub fn description(&self) -> Result<&str> {
        self.ensure_visible("read the description of")?;
        Ok(&self.description)
    }

    /// Creation time, fixed once the record is added.
    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        self.ensure_visible("read the timestamps of")?;
        to_datetime(self.created)
    }

    pub fn last_edit(&self) -> Result<DateTime<Utc>> {
        self.ensure_visible("read the timestamps of")?;
        to_datetime(self.last_edit)
    }

    /// Per-record salt, the IV of the record's own key stream.
    pub fn salt(&self) -> Result<&[u8; SALT_LEN]> {
        self.ensure_visible("read the salt of")?;
        Ok(&self.salt)
    }

    // ------------------------------------------------------------------
    // Sensitive fields
    // ------------------------------------------------------------------

    pub fn login(&self) -> Result<&str> {
        Ok(&self.credentials()?.login)
    }

    pub fn password(&self) -> Result<&str> {
        Ok(&self.credentials()?.password)
    }

    fn credentials(&self) -> Result<&AccountData> {
        self.ensure_plain("read credentials of")?;
        match &self.payload {
            Payload::Account(acct) => Ok(acct),
            Payload::Folder(_) => Err(SecureDataError::state(format!(
                "record {} is a folder and has no credentials",
                self.id
            ))),
        }
    }

    fn credentials_mut(&mut self) -> Result<&mut AccountData> {
        let id = self.id;
        match &mut self.payload {
            Payload::Account(acct) => Ok(acct),
            Payload::Folder(_) => Err(SecureDataError::state(format!(
                "record {id} is a folder and has no credentials"
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.ensure_mutable("rename")?;
        check_str("name", name, NAME_LEN)?;
        replace(&mut self.name, name);
        self.changes += 1;
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) -> Result<()> {
        self.ensure_mutable("describe")?;
        check_str("description", description, DESCRIPTION_LEN)?;
        replace(&mut self.description, description);
        self.changes += 1;
        Ok(())
    }

    pub fn set_login(&mut self, login: &str) -> Result<()> {
        self.ensure_mutable("change the login of")?;
        self.ensure_plain("change the login of")?;
        check_str("login", login, ACCOUNT_LOGIN_LEN)?;
        replace(&mut self.credentials_mut()?.login, login);
        self.changes += 1;
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.ensure_mutable("change the password of")?;
        self.ensure_plain("change the password of")?;
        check_str("password", password, ACCOUNT_PASSWORD_LEN)?;
        replace(&mut self.credentials_mut()?.password, password);
        self.changes += 1;
        Ok(())
    }

    /// Move the record under folder `parent_id` (0 for root level).
    ///
    /// The target is validated by the store when the edit is committed.
    pub fn set_parent(&mut self, parent_id: u32) -> Result<()> {
        self.ensure_mutable("move")?;
        if self.id != 0 && parent_id == self.id {
            return Err(SecureDataError::state(format!(
                "record {} cannot be its own parent",
                self.id
            )));
        }
        if parent_id != self.parent_id {
            self.parent_id = parent_id;
            self.changes += 1;
        }
        Ok(())
    }

    /// Protect the record's self region (and, for a folder, every
    /// descendant) with `key`. Use [`crate::store::DataBase::derive_item_key`]
    /// to turn a passphrase into a key.
    pub fn make_encrypted(&mut self, key: &SecretKey) -> Result<()> {
        self.ensure_mutable("encrypt")?;
        self.ensure_plain("encrypt")?;
        if self.encrypted {
            return Err(SecureDataError::state(format!(
                "record {} is already encrypted",
                self.id
            )));
        }
        self.cipher = Some(LayerCipher::new(key, &self.salt)?);
        self.encrypted = true;
        self.layer_changed = true;
        self.changes += 1;
        Ok(())
    }

    /// Remove the record's own encryption layer. Requires it unlocked.
    pub fn make_unencrypted(&mut self) -> Result<()> {
        self.ensure_mutable("decrypt")?;
        if !self.encrypted {
            return Err(SecureDataError::state(format!(
                "record {} is not encrypted",
                self.id
            )));
        }
        self.ensure_plain("decrypt")?;
        self.cipher = None;
        self.encrypted = false;
        self.layer_changed = true;
        self.changes += 1;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle (driven by the store)
    // ------------------------------------------------------------------

    /// Assign the id and creation time. New -> Immutable.
    pub(crate) fn finish_init(&mut self, id: u32, now_ms: i64) -> Result<()> {
        if self.phase != Phase::New || self.id != 0 {
            return Err(SecureDataError::state(format!(
                "record {} is already initialized",
                self.id
            )));
        }
        if id == 0 {
            return Err(SecureDataError::state("id 0 is reserved"));
        }
        self.id = id;
        self.created = now_ms;
        self.last_edit = now_ms;
        self.phase = Phase::Immutable;
        Ok(())
    }

    /// Immutable -> Mutable.
    pub(crate) fn unfreeze(&mut self) -> Result<()> {
        if self.phase != Phase::Immutable {
            return Err(SecureDataError::state(format!(
                "record {} is not frozen",
                self.id
            )));
        }
        self.phase = Phase::Mutable;
        Ok(())
    }

    /// Mutable -> Immutable, stamping `last_edit` if anything changed.
    pub(crate) fn freeze(&mut self, now_ms: i64) -> Result<()> {
        if self.phase != Phase::Mutable {
            return Err(SecureDataError::state(format!(
                "record {} is not being edited",
                self.id
            )));
        }
        if self.changes > 0 {
            self.last_edit = now_ms.max(self.created);
        }
        self.phase = Phase::Immutable;
        Ok(())
    }

    /// Whether encryption was switched on or off since the last call.
    pub(crate) fn take_layer_change(&mut self) -> bool {
        std::mem::take(&mut self.layer_changed)
    }

    /// The record's own key stream, if unlocked.
    pub(crate) fn layer_cipher(&self) -> Option<&LayerCipher> {
        self.cipher.as_ref()
    }

    pub(crate) fn set_layers(&mut self, parent_layers: u32, locked_layers: u32) {
        self.parent_layers = parent_layers;
        self.locked_layers = locked_layers;
    }

    pub(crate) fn set_hash(&mut self, hash: &[u8]) {
        self.raw[..HASH_LEN].copy_from_slice(hash);
    }

    pub(crate) fn add_child(&mut self, child: u32) {
        if let Payload::Folder(folder) = &mut self.payload {
            if let Err(pos) = folder.children.binary_search(&child) {
                folder.children.insert(pos, child);
            }
        }
    }

    pub(crate) fn remove_child(&mut self, child: u32) {
        if let Payload::Folder(folder) = &mut self.payload {
            folder.children.retain(|&c| c != child);
        }
    }

    /// Byte range of the lazily loaded region, if the variant has one.
    pub(crate) fn sensitive_range(&self) -> Option<std::ops::Range<usize>> {
        match self.payload {
            Payload::Account(_) => Some(SELF_START..ACCOUNT_SIZE),
            Payload::Folder(_) => None,
        }
    }

    // ------------------------------------------------------------------
    // Codec
    // ------------------------------------------------------------------

    /// Decode the record at the start of `buf` (stored bytes, master
    /// layer already removed).
    ///
    /// Only clear metadata is interpreted here; fields under encryption
    /// layers are parsed by [`Record::refresh`] once the hierarchy is known.
    pub fn try_decode(buf: &[u8]) -> Result<Decoded> {
        if buf.len() < TAG_OFFSET + 4 {
            return Ok(Decoded::NeedMoreBytes);
        }
        let raw_tag = read_u32(buf, TAG_OFFSET);
        let tag = raw_tag & !TOMBSTONE_BIT;
        let variant = registry()?
            .lookup(tag)
            .ok_or_else(|| SecureDataError::corrupted(format!("unknown record type tag {tag}")))?;
        let size = variant.size;
        if buf.len() < size {
            return Ok(Decoded::NeedMoreBytes);
        }

        let bytes = &buf[..size];
        let id = read_u32(bytes, ID_OFFSET);
        if raw_tag & TOMBSTONE_BIT != 0 {
            return Ok(Decoded::Tombstoned { id, consumed: size });
        }
        if id == 0 {
            return Err(SecureDataError::corrupted("live record with id 0"));
        }
        if !hash_matches(bytes) {
            return Err(SecureDataError::IntegrityFailure { id });
        }

        let payload = (variant.empty)();
        let mut raw = Zeroizing::new(bytes.to_vec());
        let loaded = !matches!(payload, Payload::Account(_));
        if !loaded {
            raw[SELF_START..].zeroize();
        }

        let record = Self {
            payload,
            id,
            parent_id: read_u32(bytes, PARENT_OFFSET),
            encrypted: read_u32(bytes, FLAGS_OFFSET) & FLAG_ENCRYPTED != 0,
            created: 0,
            last_edit: 0,
            salt: [0u8; SALT_LEN],
            name: String::new(),
            description: String::new(),
            raw,
            cipher: None,
            parent_layers: 0,
            locked_layers: 0,
            loaded,
            phase: Phase::Immutable,
            changes: 0,
            layer_changed: false,
        };
        Ok(Decoded::Record {
            record,
            consumed: size,
        })
    }

    /// Serialize, apply the record's own layer and then every layer in
    /// `chain` (the encrypted ancestors), and rehash.
    ///
    /// Returns the stored bytes; `raw` becomes the plaintext.
    pub(crate) fn flush(&mut self, chain: &[LayerCipher]) -> Result<Zeroizing<Vec<u8>>> {
        self.ensure_plain("flush")?;
        if self.id == 0 {
            return Err(SecureDataError::state("cannot flush a record without an id"));
        }

        let kind = self.kind();
        let mut plain = Zeroizing::new(vec![0u8; kind.size()]);
        write_u32(&mut plain, TAG_OFFSET, kind.tag());
        write_u32(&mut plain, ID_OFFSET, self.id);
        write_u32(&mut plain, PARENT_OFFSET, self.parent_id);
        let flags = if self.encrypted { FLAG_ENCRYPTED } else { 0 };
        write_u32(&mut plain, FLAGS_OFFSET, flags);
        write_i64(&mut plain, CREATED_OFFSET, self.created);
        write_i64(&mut plain, EDITED_OFFSET, self.last_edit);
        plain[SALT_OFFSET..SALT_OFFSET + SALT_LEN].copy_from_slice(&self.salt);
        write_str(&mut plain, NAME_OFFSET, NAME_LEN, "name", &self.name)?;
        write_str(
            &mut plain,
            DESCRIPTION_OFFSET,
            DESCRIPTION_LEN,
            "description",
            &self.description,
        )?;
        match &self.payload {
            Payload::Account(acct) => {
                write_str(
                    &mut plain,
                    ACCOUNT_LOGIN_OFFSET,
                    ACCOUNT_LOGIN_LEN,
                    "login",
                    &acct.login,
                )?;
                write_str(
                    &mut plain,
                    ACCOUNT_PASSWORD_OFFSET,
                    ACCOUNT_PASSWORD_LEN,
                    "password",
                    &acct.password,
                )?;
            }
            Payload::Folder(_) => {
                fill_random(&mut plain[SELF_START..SELF_START + FOLDER_SEAL_LEN]);
            }
        }
        write_seal(&self.salt, &mut plain[SELF_START..]);

        let mut stored = plain.clone();
        if let Some(cipher) = &self.cipher {
            cipher.transform_at(&mut stored[SELF_START..], 0)?;
        }
        for ancestor in chain {
            apply_wide(&mut stored, self.id, ancestor)?;
        }
        rehash(&mut stored);

        plain[..HASH_LEN].copy_from_slice(&stored[..HASH_LEN]);
        self.raw = plain;
        self.loaded = true;
        self.changes = 0;
        Ok(stored)
    }

    /// Re-parse fields from `raw` according to the current lock state,
    /// wiping whatever is no longer readable.
    pub(crate) fn refresh(&mut self) -> Result<()> {
        if !self.is_visible() {
            self.clear_fields();
            return Ok(());
        }
        self.created = read_i64(&self.raw, CREATED_OFFSET);
        self.last_edit = read_i64(&self.raw, EDITED_OFFSET);
        self.salt = read_salt(&self.raw, SALT_OFFSET);
        let name = read_str(&self.raw, NAME_OFFSET, NAME_LEN, "name")?;
        replace(&mut self.name, &name);
        let description = read_str(&self.raw, DESCRIPTION_OFFSET, DESCRIPTION_LEN, "description")?;
        replace(&mut self.description, &description);

        if self.loaded && !self.is_self_locked() {
            self.parse_sensitive()
        } else {
            self.clear_sensitive();
            Ok(())
        }
    }

    /// Take the stored bytes of the sensitive region, strip the
    /// ancestors' layers in `chain` and the record's own unlocked layer.
    pub(crate) fn absorb_sensitive(&mut self, stored: &[u8], chain: &[LayerCipher]) -> Result<()> {
        self.ensure_visible("load sensitive data of")?;
        let range = self.sensitive_range().ok_or_else(|| {
            SecureDataError::state(format!("record {} has no sensitive region", self.id))
        })?;
        if stored.len() != range.len() {
            return Err(SecureDataError::corrupted(format!(
                "sensitive region of record {} has {} bytes, expected {}",
                self.id,
                stored.len(),
                range.len()
            )));
        }

        let id = self.id;
        let region = &mut self.raw[range];
        region.copy_from_slice(stored);
        for ancestor in chain {
            ancestor.wide(id).transform_at(region, SELF_WIDE_COUNTER)?;
        }
        if let Some(cipher) = &self.cipher {
            cipher.transform_at(region, 0)?;
        }
        self.loaded = true;

        if self.is_self_locked() {
            Ok(())
        } else {
            self.parse_sensitive()
        }
    }

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------

    /// An encrypted ancestor is being locked: re-apply its wide stream.
    pub(crate) fn lock_layer(&mut self, ancestor: &LayerCipher) -> Result<()> {
        let end = self.layer_end();
        ancestor.wide(self.id).transform_at(&mut self.raw[LAYER_START..end], 0)?;
        self.locked_layers += 1;
        if self.locked_layers == 1 {
            self.clear_fields();
        }
        Ok(())
    }

    /// An encrypted ancestor was unlocked: strip its wide stream.
    pub(crate) fn unlock_layer(&mut self, ancestor: &LayerCipher) -> Result<()> {
        if self.locked_layers == 0 {
            return Err(SecureDataError::state(format!(
                "record {} has no locked layer",
                self.id
            )));
        }
        let end = self.layer_end();
        ancestor.wide(self.id).transform_at(&mut self.raw[LAYER_START..end], 0)?;
        self.locked_layers -= 1;
        if self.locked_layers == 0 {
            self.refresh()?;
        }
        Ok(())
    }

    /// Try `key` against the record's own layer.
    ///
    /// On a wrong key the self region is restored and `false` returned.
    pub(crate) fn try_unlock(&mut self, key: &SecretKey) -> Result<bool> {
        self.ensure_visible("unlock")?;
        if !self.encrypted {
            return Err(SecureDataError::state(format!(
                "record {} is not encrypted",
                self.id
            )));
        }
        if self.cipher.is_some() {
            return Err(SecureDataError::state(format!(
                "record {} is already unlocked",
                self.id
            )));
        }
        if !self.loaded {
            return Err(SecureDataError::state(format!(
                "sensitive data of record {} is not loaded",
                self.id
            )));
        }

        let cipher = LayerCipher::new(key, &self.salt)?;
        cipher.transform_at(&mut self.raw[SELF_START..], 0)?;
        if !seal_matches(&self.salt, &self.raw[SELF_START..]) {
            cipher.transform_at(&mut self.raw[SELF_START..], 0)?;
            return Ok(false);
        }

        self.cipher = Some(cipher);
        self.parse_sensitive()?;
        Ok(true)
    }

    /// Re-apply the record's own layer and forget its key.
    ///
    /// Returns the key stream so the caller can lock descendants.
    pub(crate) fn lock(&mut self) -> Result<LayerCipher> {
        self.ensure_visible("lock")?;
        if self.phase != Phase::Immutable || self.changes != 0 {
            return Err(SecureDataError::state(format!(
                "record {} has pending changes",
                self.id
            )));
        }
        let cipher = self.cipher.take().ok_or_else(|| {
            SecureDataError::state(format!("record {} is not unlocked", self.id))
        })?;
        if self.loaded {
            cipher.transform_at(&mut self.raw[SELF_START..], 0)?;
        }
        self.clear_sensitive();
        Ok(cipher)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn layer_end(&self) -> usize {
        if self.loaded {
            self.raw.len()
        } else {
            SELF_START
        }
    }

    fn parse_sensitive(&mut self) -> Result<()> {
        let id = self.id;
        if let Payload::Account(acct) = &mut self.payload {
            if !seal_matches(&self.salt, &self.raw[SELF_START..]) {
                return Err(SecureDataError::IntegrityFailure { id });
            }
            let login = read_str(&self.raw, ACCOUNT_LOGIN_OFFSET, ACCOUNT_LOGIN_LEN, "login")?;
            replace(&mut acct.login, &login);
            let password = Zeroizing::new(read_str(
                &self.raw,
                ACCOUNT_PASSWORD_OFFSET,
                ACCOUNT_PASSWORD_LEN,
                "password",
            )?);
            replace(&mut acct.password, &password);
        }
        Ok(())
    }

    fn clear_sensitive(&mut self) {
        if let Payload::Account(acct) = &mut self.payload {
            acct.zeroize();
        }
    }

    fn clear_fields(&mut self) {
        self.name.zeroize();
        self.description.zeroize();
        self.salt.zeroize();
        self.created = 0;
        self.last_edit = 0;
        self.clear_sensitive();
    }

    fn ensure_visible(&self, op: &str) -> Result<()> {
        if self.is_visible() {
            Ok(())
        } else {
            Err(SecureDataError::state(format!(
                "cannot {op} record {}: {} enclosing folder(s) locked",
                self.id, self.locked_layers
            )))
        }
    }

    /// Visible, loaded and not self-locked: `raw` is plaintext.
    fn ensure_plain(&self, op: &str) -> Result<()> {
        self.ensure_visible(op)?;
        if !self.loaded {
            return Err(SecureDataError::state(format!(
                "cannot {op} record {}: sensitive data not loaded",
                self.id
            )));
        }
        if self.is_self_locked() {
            return Err(SecureDataError::state(format!(
                "cannot {op} record {}: record is locked",
                self.id
            )));
        }
        Ok(())
    }

    fn ensure_mutable(&self, op: &str) -> Result<()> {
        if self.is_mutable() {
            Ok(())
        } else {
            Err(SecureDataError::state(format!(
                "cannot {op} record {} outside of an edit",
                self.id
            )))
        }
    }
}

impl Drop for Record {
    fn drop(&mut self) {
        self.name.zeroize();
        self.description.zeroize();
        self.salt.zeroize();
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("parent_id", &self.parent_id)
            .field("encrypted", &self.encrypted)
            .field("parent_layers", &self.parent_layers)
            .field("locked_layers", &self.locked_layers)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Byte-level helpers shared with the store
// ---------------------------------------------------------------------------

/// XOR ancestor `ancestor`'s wide stream for record `id` over the layer
/// region of `stored`. Adds the layer if absent, strips it if present.
pub(crate) fn apply_wide(stored: &mut [u8], id: u32, ancestor: &LayerCipher) -> Result<()> {
    ancestor.wide(id).transform_at(&mut stored[LAYER_START..], 0)
}

/// Recompute the hash of stored record bytes in place.
pub(crate) fn rehash(stored: &mut [u8]) {
    let hash = digest(&stored[HASH_LEN..]);
    stored[..HASH_LEN].copy_from_slice(&hash);
}

/// Whether stored record bytes match their embedded hash.
pub(crate) fn hash_matches(stored: &[u8]) -> bool {
    ct_eq(&digest(&stored[HASH_LEN..]), &stored[..HASH_LEN])
}

fn seal_check(salt: &[u8], body: &[u8]) -> [u8; CHECK_LEN] {
    let full = digest_parts(&[SEAL_DOMAIN, salt, body]);
    let mut check = [0u8; CHECK_LEN];
    check.copy_from_slice(&full[..CHECK_LEN]);
    check
}

fn write_seal(salt: &[u8], region: &mut [u8]) {
    let body = region.len() - CHECK_LEN;
    let check = seal_check(salt, &region[..body]);
    region[body..].copy_from_slice(&check);
}

fn seal_matches(salt: &[u8], region: &[u8]) -> bool {
    let body = region.len() - CHECK_LEN;
    ct_eq(&seal_check(salt, &region[..body]), &region[body..])
}

fn replace(slot: &mut String, value: &str) {
    slot.zeroize();
    slot.push_str(value);
}

fn to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| SecureDataError::corrupted(format!("timestamp {ms} out of range")))
}
