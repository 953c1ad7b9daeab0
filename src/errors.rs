use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in SecureData.
#[derive(Debug, Error)]
pub enum SecureDataError {
    // --- Structural errors ---
    #[error("Store is corrupted: {0}")]
    Corrupted(String),

    #[error("Store format version mismatch: file has {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Record {id} failed its integrity check")]
    IntegrityFailure { id: u32 },

    // --- Lifecycle errors ---
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Record {0} not found")]
    NotFound(u32),

    #[error("Field '{field}' exceeds {max} bytes")]
    FieldTooLong { field: &'static str, max: usize },

    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Wrong password or corrupted store")]
    WrongPassword,

    #[error("Wrong key for record {0}")]
    WrongItemKey(u32),

    // --- Store file errors ---
    #[error("Store not found at {0}")]
    StoreNotFound(PathBuf),

    #[error("Store already exists at {0}")]
    StoreAlreadyExists(PathBuf),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Audit error: {0}")]
    AuditError(String),
}

impl SecureDataError {
    /// Shorthand for [`SecureDataError::InvalidState`].
    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Shorthand for [`SecureDataError::Corrupted`].
    pub(crate) fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }
}

/// Convenience type alias for SecureData results.
pub type Result<T> = std::result::Result<T, SecureDataError>;
