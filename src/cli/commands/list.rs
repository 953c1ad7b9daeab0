//! `securedata list` — show every record as a tree.
//!
//! Nothing is unlocked here: records inside a locked folder are listed
//! by id and type only.

use crate::cli::output::{self, RecordRow};
use crate::cli::{open_store, Cli};
use crate::errors::{Result, SecureDataError};
use crate::store::DataBase;

/// Execute the `list` command.
pub fn execute(cli: &Cli, json: bool) -> Result<()> {
    let db = open_store(cli)?;
    let rows = collect_rows(&db)?;

    if json {
        let text = serde_json::to_string_pretty(&rows)
            .map_err(|e| SecureDataError::SerializationError(format!("JSON: {e}")))?;
        println!("{text}");
    } else {
        output::print_records_table(&rows);
    }
    Ok(())
}

/// Rows in pre-order, children indented under their folder.
pub fn collect_rows(db: &DataBase) -> Result<Vec<RecordRow>> {
    let mut rows = Vec::with_capacity(db.len());
    let mut stack: Vec<(u32, usize)> = db.root().iter().rev().map(|r| (r.id(), 0)).collect();

    while let Some((id, depth)) = stack.pop() {
        let record = db.get(id)?;
        let visible = record.is_visible();
        rows.push(RecordRow {
            id,
            parent: record.parent_id(),
            depth,
            kind: record.kind().to_string(),
            name: visible.then(|| record.name().map(str::to_owned)).transpose()?,
            encrypted: record.is_encrypted(),
            locked: record.is_self_locked(),
            updated: visible
                .then(|| {
                    record
                        .last_edit()
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                })
                .transpose()?,
        });
        stack.extend(record.children().iter().rev().map(|&child| (child, depth + 1)));
    }
    Ok(rows)
}
