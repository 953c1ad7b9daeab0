//! `securedata add-account` — store a login/password pair.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{describe, open_store, unlock_path, Cli};
use crate::errors::{Result, SecureDataError};
use crate::store::Record;

/// Fields of a new account as given on the command line.
pub struct NewAccount<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub parent: u32,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// Execute the `add-account` command.
pub fn execute(cli: &Cli, new: &NewAccount<'_>) -> Result<()> {
    // Get the password from the argument or prompt for it.
    let password = match new.password {
        Some(p) => Zeroizing::new(p.to_string()),
        None => Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Password for '{}'", new.name))
                .allow_empty_password(true)
                .interact()
                .map_err(|e| SecureDataError::CommandFailed(format!("password prompt: {e}")))?,
        ),
    };

    let mut db = open_store(cli)?;
    unlock_path(&mut db, new.parent, true)?;

    let mut account = Record::account(new.name)?;
    if let Some(description) = new.description {
        account.set_description(description)?;
    }
    if let Some(username) = new.username {
        account.set_login(username)?;
    }
    account.set_password(&password)?;
    account.set_parent(new.parent)?;
    let id = db.add_data(account)?;

    let path = db.file_path().to_path_buf();
    let label = describe(&db, id);
    db.close()?;

    crate::audit::log_audit(&path, "add", Some(id), Some("account"));
    output::success(&format!("Added {label}"));
    Ok(())
}
