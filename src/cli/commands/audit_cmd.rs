//! `securedata audit` — display the audit log.
//!
//! Usage:
//!   securedata audit               # show last 50 entries
//!   securedata audit --last 20     # show last 20
//!   securedata audit --since 7d    # entries from last 7 days

use chrono::Utc;

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::{settings, store_path, Cli};
use crate::errors::{Result, SecureDataError};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let since_dt = match since {
        Some(s) => Some(parse_duration(s)?),
        None => None,
    };

    let settings = settings()?;
    let path = store_path(cli, &settings)?;

    let audit = AuditLog::open(&path)
        .ok_or_else(|| SecureDataError::AuditError("failed to open audit database".into()))?;

    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// Parse a human-friendly duration string like "7d", "24h", "30m" into
/// the point in time that far back.
fn parse_duration(input: &str) -> Result<chrono::DateTime<Utc>> {
    let input = input.trim();
    let invalid = |why: &str| {
        SecureDataError::CommandFailed(format!(
            "invalid duration '{input}' — {why}"
        ))
    };

    let split = input
        .char_indices()
        .last()
        .map(|(i, _)| i)
        .ok_or_else(|| invalid("use format like 7d, 24h, or 30m"))?;
    let (num_str, unit) = input.split_at(split);

    let num: i64 = num_str
        .parse()
        .map_err(|_| invalid("number part is not valid"))?;

    let duration = match unit {
        "d" => chrono::Duration::try_days(num),
        "h" => chrono::Duration::try_hours(num),
        "m" => chrono::Duration::try_minutes(num),
        _ => return Err(invalid("use format like 7d, 24h, or 30m")),
    }
    .ok_or_else(|| invalid("too large"))?;

    Ok(Utc::now() - duration)
}

/// Print audit entries in a formatted table.
pub fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Store", "Item", "Details"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let op = colorize_operation(&entry.operation);
        let item = entry
            .item_id
            .map_or_else(|| "-".to_string(), |id| format!("#{id}"));
        let details = entry.details.as_deref().unwrap_or("-");

        table.add_row(vec![
            time,
            op,
            entry.store.clone(),
            item,
            details.to_string(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize operation names for display.
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "init" | "add" => style(op).green().to_string(),
        "edit" => style(op).blue().to_string(),
        "delete" => style(op).red().to_string(),
        "encrypt" => style(op).yellow().to_string(),
        "decrypt" => style(op).magenta().to_string(),
        _ => op.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ago(input: &str) -> chrono::Duration {
        Utc::now() - parse_duration(input).unwrap()
    }

    #[test]
    fn units_are_days_hours_minutes() {
        assert!((ago("7d").num_days() - 7).abs() <= 1);
        assert!((ago("24h").num_hours() - 24).abs() <= 1);
        assert!((ago(" 30m ").num_minutes() - 30).abs() <= 1);
    }

    #[test]
    fn malformed_durations_are_rejected() {
        for bad in ["", "d", "7", "7x", "abc", "1.5h", "9999999999999999d"] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn every_store_operation_has_a_color() {
        for op in ["init", "add", "edit", "delete", "encrypt", "decrypt"] {
            assert!(colorize_operation(op).contains(op));
        }
        assert_eq!(colorize_operation("other"), "other");
    }

    #[cfg(feature = "audit-log")]
    #[test]
    fn since_filter_uses_parsed_duration() {
        let dir = tempfile::TempDir::new().unwrap();
        let audit = AuditLog::open(&dir.path().join("secure.sdb")).unwrap();
        audit.log("edit", "secure.sdb", Some(2), None);

        let recent = audit.query(10, Some(parse_duration("1h").unwrap())).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].item_id, Some(2));
    }
}
