//! `securedata delete` — remove a record (a folder takes its contents with it).

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{describe, open_store, unlock_path, Cli};
use crate::errors::{Result, SecureDataError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: u32, force: bool) -> Result<()> {
    let mut db = open_store(cli)?;
    unlock_path(&mut db, id, false)?;

    let label = describe(&db, id);
    let inside = db.descendants(id)?.len();

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let prompt = if inside > 0 {
            format!("Delete {label} and the {inside} records inside it?")
        } else {
            format!("Delete {label}?")
        };
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| SecureDataError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let removed = db.delete_data(id)?;
    let path = db.file_path().to_path_buf();
    db.close()?;

    crate::audit::log_audit(&path, "delete", Some(id), Some(&format!("{removed} records")));
    output::success(&format!("Deleted {label} ({removed} records)"));
    Ok(())
}
