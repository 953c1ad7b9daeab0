//! `securedata init` — create a new, empty store.

use std::fs;

use crate::cli::output;
use crate::cli::{prompt_new_password, settings, store_path, Cli};
use crate::errors::{Result, SecureDataError};
use crate::store::DataBase;

/// Execute the `init` command.
pub fn execute(cli: &Cli, login: &str) -> Result<()> {
    let settings = settings()?;
    let path = store_path(cli, &settings)?;

    // 1. Refuse to touch an existing store.
    if path.exists() && fs::metadata(&path)?.len() > 0 {
        output::tip("Use `securedata add-folder` or `securedata add-account` to add records.");
        return Err(SecureDataError::StoreAlreadyExists(path));
    }

    // 2. Create the parent directory if it doesn't exist.
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
            output::info(&format!("Created directory: {}", dir.display()));
        }
    }

    // 3. Prompt for a new password (with confirmation).
    let password = prompt_new_password()?;

    // 4. Write the header.
    let mut db = DataBase::open_with_cache(&path, settings.sensitive_cache_capacity)?;
    db.create(login, password.as_bytes(), settings.kdf_params())?;
    db.close()?;
    output::success(&format!("Store created for '{login}' at {}", path.display()));

    // 5. Audit log.
    crate::audit::log_audit(&path, "init", None, Some("store created"));

    // 6. Show helpful tips.
    output::tip("Run `securedata add-folder <NAME>` to create a folder.");
    output::tip("Run `securedata add-account <NAME> --username <LOGIN>` to store an account.");

    Ok(())
}
