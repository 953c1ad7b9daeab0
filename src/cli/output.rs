//! Styled status lines and tables for the command-line front end.

use comfy_table::{ContentArrangement, Table};
use console::style;
use serde::Serialize;

/// One line of `securedata list`. Fields hidden behind a locked folder
/// are `None`.
#[derive(Debug, Clone, Serialize)]
pub struct RecordRow {
    pub id: u32,
    pub parent: u32,
    pub depth: usize,
    pub kind: String,
    pub name: Option<String>,
    pub encrypted: bool,
    pub locked: bool,
    pub updated: Option<String>,
}

/// Green check mark.
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Red cross, on stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Yellow warning sign, on stderr.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Dimmed hint after an arrow.
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the record tree (Id, Type, Name, Encrypted, Updated).
pub fn print_records_table(rows: &[RecordRow]) {
    if rows.is_empty() {
        info("The store is empty.");
        tip("Run `securedata add-folder <NAME>` or `securedata add-account <NAME>`.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Type", "Name", "Encrypted", "Updated"]);

    for row in rows {
        let indent = "  ".repeat(row.depth);
        let name = match &row.name {
            Some(name) => format!("{indent}{name}"),
            None => format!("{indent}{}", style("<locked>").dim()),
        };
        let encrypted = match (row.encrypted, row.locked) {
            (true, true) => "yes (locked)",
            (true, false) => "yes",
            (false, _) => "-",
        };
        table.add_row(vec![
            row.id.to_string(),
            row.kind.clone(),
            name,
            encrypted.to_string(),
            row.updated.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("{table}");
}

/// Print `label: value` pairs as a two-column table.
pub fn print_fields(fields: &[(&str, String)]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    for (label, value) in fields {
        table.add_row(vec![style(label).bold().to_string(), value.clone()]);
    }
    println!("{table}");
}
