//! `securedata edit` — change fields of a record or move it.

use crate::cli::output;
use crate::cli::{describe, open_store, unlock_path, Cli};
use crate::errors::Result;

/// Requested changes; `None` leaves a field as it is.
#[derive(Default)]
pub struct Changes<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub parent: Option<u32>,
}

impl Changes<'_> {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.parent.is_none()
    }

    /// Names of the fields being changed, for the audit trail.
    fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.name.is_some() {
            parts.push("name".to_string());
        }
        if self.description.is_some() {
            parts.push("description".to_string());
        }
        if self.username.is_some() {
            parts.push("login".to_string());
        }
        if self.password.is_some() {
            parts.push("password".to_string());
        }
        if let Some(parent) = self.parent {
            parts.push(format!("moved to #{parent}"));
        }
        parts.join(", ")
    }
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, id: u32, changes: &Changes<'_>) -> Result<()> {
    if changes.is_empty() {
        output::info("Nothing to change.");
        output::tip("Pass --name, --description, --username, --password or --parent.");
        return Ok(());
    }

    let mut db = open_store(cli)?;
    unlock_path(&mut db, id, true)?;
    if let Some(parent) = changes.parent {
        unlock_path(&mut db, parent, true)?;
    }

    let changed = db.modify_data(id, |record| {
        if let Some(name) = changes.name {
            record.set_name(name)?;
        }
        if let Some(description) = changes.description {
            record.set_description(description)?;
        }
        if let Some(username) = changes.username {
            record.set_login(username)?;
        }
        if let Some(password) = changes.password {
            record.set_password(password)?;
        }
        if let Some(parent) = changes.parent {
            record.set_parent(parent)?;
        }
        Ok(())
    })?;

    let path = db.file_path().to_path_buf();
    let label = describe(&db, id);
    db.close()?;

    if changed {
        crate::audit::log_audit(&path, "edit", Some(id), Some(&changes.summary()));
        output::success(&format!("Updated {label}"));
    } else {
        output::info(&format!("{label} is unchanged."));
    }
    Ok(())
}
