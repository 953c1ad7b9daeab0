//! `securedata show` — print one record, unlocking what is needed.

use crate::cli::output;
use crate::cli::{open_store, unlock_path, Cli};
use crate::errors::Result;
use crate::store::Kind;

/// Execute the `show` command.
pub fn execute(cli: &Cli, id: u32) -> Result<()> {
    let mut db = open_store(cli)?;
    unlock_path(&mut db, id, true)?;
    db.load_sensitive(id)?;

    let record = db.get(id)?;
    let location = db
        .path(id)?
        .iter()
        .filter(|&&step| step != id)
        .map(|&step| {
            db.get(step)
                .and_then(|r| r.name().map(str::to_owned))
                .unwrap_or_else(|_| format!("#{step}"))
        })
        .collect::<Vec<_>>()
        .join(" / ");

    let mut fields = vec![
        ("Id", id.to_string()),
        ("Type", record.kind().to_string()),
        ("Name", record.name()?.to_string()),
        ("Description", record.description()?.to_string()),
        (
            "Location",
            if location.is_empty() {
                "/".to_string()
            } else {
                location
            },
        ),
        (
            "Encrypted",
            if record.is_encrypted() { "yes" } else { "no" }.to_string(),
        ),
        (
            "Created",
            record.created_at()?.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        (
            "Updated",
            record.last_edit()?.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
    ];

    match record.kind() {
        Kind::Account => {
            fields.push(("Login", record.login()?.to_string()));
            fields.push(("Password", record.password()?.to_string()));
        }
        Kind::Folder => {
            fields.push(("Children", record.children().len().to_string()));
        }
    }

    output::print_fields(&fields);
    Ok(())
}
