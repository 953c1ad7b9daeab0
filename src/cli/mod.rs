//! CLI module — Clap argument parser, prompts, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, SecureDataError};
use crate::store::DataBase;

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable holding the store password (CI/CD).
pub const PASSWORD_ENV: &str = "SECUREDATA_PASSWORD";

/// Environment variable holding the item passphrase (CI/CD).
pub const ITEM_KEY_ENV: &str = "SECUREDATA_ITEM_KEY";

/// SecureData CLI: password-protected store for accounts and folders.
#[derive(Parser)]
#[command(
    name = "securedata",
    about = "Encrypted single-file store for accounts and folders",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store file (default: `store_path` from .securedata.toml, else secure.sdb)
    #[arg(long, global = true)]
    pub store: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty store
    Init {
        /// Login name recorded in the store header
        #[arg(long)]
        login: String,
    },

    /// Add a folder
    AddFolder {
        /// Folder name
        name: String,
        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
        /// Id of the enclosing folder (default: root level)
        #[arg(short, long, default_value = "0")]
        parent: u32,
    },

    /// Add an account
    AddAccount {
        /// Account name (e.g. gmail)
        name: String,
        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
        /// Id of the enclosing folder (default: root level)
        #[arg(short, long, default_value = "0")]
        parent: u32,
        /// Login / user name of the account
        #[arg(short, long)]
        username: Option<String>,
        /// Account password (omit for interactive prompt)
        #[arg(long)]
        password: Option<String>,
    },

    /// List every record as a tree
    List {
        /// Print machine-readable JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one record, including account credentials
    Show {
        /// Record id
        id: u32,
    },

    /// Change fields of a record, or move it
    Edit {
        /// Record id
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// New enclosing folder id (0 for root level)
        #[arg(long)]
        parent: Option<u32>,
    },

    /// Delete a record (and everything inside a folder)
    Delete {
        /// Record id
        id: u32,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Protect a record with its own passphrase
    Encrypt {
        /// Record id
        id: u32,
    },

    /// Remove a record's own passphrase
    Decrypt {
        /// Record id
        id: u32,
    },

    /// Show version information
    Version,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },

    /// View the audit log of store operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Read a secret from `var`, or prompt for it interactively.
fn secret_from_env_or_prompt(var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            return Ok(Zeroizing::new(value));
        }
    }

    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| SecureDataError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Get the store password: `SECUREDATA_PASSWORD`, then an interactive prompt.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    secret_from_env_or_prompt(PASSWORD_ENV, "Enter store password")
}

/// Prompt for a new store password with confirmation (used during `init`).
///
/// Also respects `SECUREDATA_PASSWORD` for scripted/CI usage.
/// Enforces a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSWORD_LEN {
                return Err(SecureDataError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose store password")
            .with_confirmation(
                "Confirm store password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| SecureDataError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Get the passphrase of an encrypted record: `SECUREDATA_ITEM_KEY`, then a prompt.
pub fn prompt_item_key(label: &str) -> Result<Zeroizing<String>> {
    secret_from_env_or_prompt(ITEM_KEY_ENV, &format!("Passphrase for {label}"))
}

/// Prompt for a new item passphrase with confirmation (used by `encrypt`).
pub fn prompt_new_item_key(label: &str) -> Result<Zeroizing<String>> {
    if let Ok(key) = std::env::var(ITEM_KEY_ENV) {
        if !key.is_empty() {
            return Ok(Zeroizing::new(key));
        }
    }

    let key = dialoguer::Password::new()
        .with_prompt(format!("Choose passphrase for {label}"))
        .with_confirmation("Confirm passphrase", "Passphrases do not match, try again")
        .interact()
        .map_err(|e| SecureDataError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(key))
}

/// Load `.securedata.toml` from the working directory.
pub fn settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Resolve the store file: `--store`, else the configured path.
pub fn store_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &cli.store {
        Some(path) => cwd.join(path),
        None => settings.store_path(&cwd),
    })
}

/// Open an existing store, asking for its password.
pub fn open_store(cli: &Cli) -> Result<DataBase> {
    let settings = settings()?;
    let path = store_path(cli, &settings)?;
    if !path.exists() {
        output::tip("Run `securedata init --login <NAME>` to create a store.");
        return Err(SecureDataError::StoreNotFound(path));
    }

    let mut db = DataBase::open_with_cache(&path, settings.sensitive_cache_capacity)?;
    let password = prompt_password()?;
    if !db.try_init(password.as_bytes())? {
        return Err(SecureDataError::WrongPassword);
    }
    Ok(db)
}

/// Short human label for a record, e.g. `folder 'Work' (#3)`.
pub fn describe(db: &DataBase, id: u32) -> String {
    match db.get(id) {
        Ok(record) => match record.name() {
            Ok(name) => format!("{} '{name}' (#{id})", record.kind()),
            Err(_) => format!("{} #{id}", record.kind()),
        },
        Err(_) => format!("record #{id}"),
    }
}

/// Unlock every encrypted record on the way down to `id`, prompting for
/// each passphrase. With `include_target` the record itself is unlocked
/// as well.
pub fn unlock_path(db: &mut DataBase, id: u32, include_target: bool) -> Result<()> {
    if id == 0 {
        return Ok(());
    }
    let mut path = db.path(id)?;
    if !include_target {
        path.pop();
    }

    for step in path {
        let record = db.get(step)?;
        if !record.is_self_locked() {
            continue;
        }
        let label = describe(db, step);
        let passphrase = prompt_item_key(&label)?;
        let key = db.derive_item_key(passphrase.as_bytes(), db.get(step)?)?;
        if !db.try_unlock(step, &key)? {
            return Err(SecureDataError::WrongItemKey(step));
        }
    }
    Ok(())
}
