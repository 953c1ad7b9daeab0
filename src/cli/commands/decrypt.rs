//! `securedata decrypt` — remove a record's own passphrase.

use crate::cli::output;
use crate::cli::{describe, open_store, unlock_path, Cli};
use crate::errors::{Result, SecureDataError};

/// Execute the `decrypt` command.
pub fn execute(cli: &Cli, id: u32) -> Result<()> {
    let mut db = open_store(cli)?;
    unlock_path(&mut db, id, true)?;

    let label = describe(&db, id);
    if !db.get(id)?.is_encrypted() {
        return Err(SecureDataError::CommandFailed(format!(
            "{label} is not encrypted"
        )));
    }

    db.modify_data(id, |record| record.make_unencrypted())?;

    let path = db.file_path().to_path_buf();
    db.close()?;

    crate::audit::log_audit(&path, "decrypt", Some(id), None);
    output::success(&format!("Decrypted {label}"));
    Ok(())
}
