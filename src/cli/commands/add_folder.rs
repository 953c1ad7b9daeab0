//! `securedata add-folder` — create a folder.

use crate::cli::output;
use crate::cli::{describe, open_store, unlock_path, Cli};
use crate::errors::Result;
use crate::store::Record;

/// Execute the `add-folder` command.
pub fn execute(cli: &Cli, name: &str, description: Option<&str>, parent: u32) -> Result<()> {
    let mut db = open_store(cli)?;
    unlock_path(&mut db, parent, true)?;

    let mut folder = Record::folder(name)?;
    if let Some(description) = description {
        folder.set_description(description)?;
    }
    folder.set_parent(parent)?;
    let id = db.add_data(folder)?;

    let path = db.file_path().to_path_buf();
    let label = describe(&db, id);
    db.close()?;

    crate::audit::log_audit(&path, "add", Some(id), Some("folder"));
    output::success(&format!("Added {label}"));
    Ok(())
}
