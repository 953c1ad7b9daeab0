//! `securedata encrypt` — protect a record with its own passphrase.
//!
//! Encrypting a folder also hides every record inside it until the
//! folder is unlocked again.

use crate::cli::output;
use crate::cli::{describe, open_store, prompt_new_item_key, unlock_path, Cli};
use crate::errors::{Result, SecureDataError};

/// Execute the `encrypt` command.
pub fn execute(cli: &Cli, id: u32) -> Result<()> {
    let mut db = open_store(cli)?;
    unlock_path(&mut db, id, false)?;

    let label = describe(&db, id);
    if db.get(id)?.is_encrypted() {
        return Err(SecureDataError::CommandFailed(format!(
            "{label} is already encrypted"
        )));
    }

    let passphrase = prompt_new_item_key(&label)?;
    let key = db.derive_item_key(passphrase.as_bytes(), db.get(id)?)?;
    db.modify_data(id, |record| record.make_encrypted(&key))?;

    let path = db.file_path().to_path_buf();
    db.close()?;

    crate::audit::log_audit(&path, "encrypt", Some(id), None);
    output::success(&format!("Encrypted {label}"));
    output::tip("You will be asked for this passphrase whenever the record is opened.");
    Ok(())
}
