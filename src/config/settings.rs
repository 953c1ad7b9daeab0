use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::KdfParams;
use crate::errors::{Result, SecureDataError};

/// Contents of `.securedata.toml`. Absent keys, or an absent file, fall
/// back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Store file (relative to the project root unless absolute).
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Argon2d pass count for new stores (default: 5).
    #[serde(default = "default_argon2_time_cost")]
    pub argon2_time_cost: u32,

    /// Argon2d memory cost in KiB for new stores (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2d parallelism for new stores (default: 1).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// How many sensitive regions to keep cached (ciphertext only).
    #[serde(default = "default_sensitive_cache_capacity")]
    pub sensitive_cache_capacity: usize,
}

fn default_store_path() -> String {
    "secure.sdb".to_string()
}

fn default_argon2_time_cost() -> u32 {
    5
}

fn default_argon2_memory_kib() -> u32 {
    64 * 1024
}

fn default_argon2_parallelism() -> u32 {
    1
}

fn default_sensitive_cache_capacity() -> usize {
    64
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            argon2_time_cost: default_argon2_time_cost(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_parallelism: default_argon2_parallelism(),
            sensitive_cache_capacity: default_sensitive_cache_capacity(),
        }
    }
}

impl Settings {
    /// Looked up in the working directory.
    pub const FILE_NAME: &'static str = ".securedata.toml";

    /// Read `<dir>/.securedata.toml`; a missing file yields the defaults
    /// and a malformed one is a `ConfigError`.
    pub fn load(dir: &Path) -> Result<Self> {
        let file = dir.join(Self::FILE_NAME);
        if !file.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&file)?;
        toml::from_str(&text).map_err(|e| {
            SecureDataError::ConfigError(format!("Failed to parse {}: {e}", file.display()))
        })
    }

    /// Resolve the store file against the project directory.
    pub fn store_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.store_path)
    }

    /// KDF parameters used when creating a new store.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            time_cost: self.argon2_time_cost,
            memory_kib: self.argon2_memory_kib,
            parallelism: self.argon2_parallelism,
        }
    }
}
