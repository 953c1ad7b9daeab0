//! Operation history for a store, kept in a SQLite file beside it.
//!
//! Every mutating command (init, add, edit, delete, encrypt, decrypt) adds
//! a row to `.securedata-audit.db` in the store's directory. A database
//! that cannot be opened or written is skipped. Without the `audit-log`
//! feature every call is a no-op.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::errors::Result;
#[cfg(feature = "audit-log")]
use crate::errors::SecureDataError;

/// File name of the audit database.
pub const DB_FILE_NAME: &str = ".securedata-audit.db";

/// One row of the audit table.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub store: String,
    pub item_id: Option<u32>,
    pub details: Option<String>,
}

/// Handle on a store's audit database.
pub struct AuditLog {
    #[cfg(feature = "audit-log")]
    conn: rusqlite::Connection,
}

impl AuditLog {
    /// Return the path to the audit database for a store file.
    pub fn db_path(store_path: &Path) -> PathBuf {
        store_path
            .parent()
            .map_or_else(|| PathBuf::from(DB_FILE_NAME), |dir| dir.join(DB_FILE_NAME))
    }

    /// Open (or create) the audit database belonging to `store_path`.
    ///
    /// `None` means auditing is unavailable for this run; commands carry on.
    #[cfg(feature = "audit-log")]
    pub fn open(store_path: &Path) -> Option<Self> {
        let db_path = Self::db_path(store_path);
        let conn = rusqlite::Connection::open(&db_path).ok()?;

        // Owner-only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                store       TEXT NOT NULL,
                item_id     INTEGER,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    #[cfg(not(feature = "audit-log"))]
    pub fn open(_store_path: &Path) -> Option<Self> {
        None
    }

    /// Append one row. Write errors are dropped.
    #[cfg(feature = "audit-log")]
    pub fn log(&self, operation: &str, store: &str, item_id: Option<u32>, details: Option<&str>) {
        let now = Utc::now().to_rfc3339();
        let _ = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, store, item_id, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![now, operation, store, item_id, details],
        );
    }

    #[cfg(not(feature = "audit-log"))]
    pub fn log(&self, _operation: &str, _store: &str, _item_id: Option<u32>, _details: Option<&str>) {}

    /// Newest entries first.
    ///
    /// At most `limit` rows; with `since`, only rows at or after it.
    #[cfg(feature = "audit-log")]
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let since = since.map(|ts| ts.to_rfc3339());

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, operation, store, item_id, details
                 FROM audit_log
                 WHERE ?1 IS NULL OR timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e| SecureDataError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![since, limit], row_to_entry)
            .map_err(|e| SecureDataError::AuditError(format!("query exec: {e}")))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SecureDataError::AuditError(format!("row parse: {e}")))
    }

    #[cfg(not(feature = "audit-log"))]
    pub fn query(&self, _limit: usize, _since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        Ok(Vec::new())
    }
}

#[cfg(feature = "audit-log")]
fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let raw: String = row.get(1)?;
    // An unparsable timestamp reads back as now.
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));
    Ok(AuditEntry {
        id: row.get(0)?,
        timestamp,
        operation: row.get(2)?,
        store: row.get(3)?,
        item_id: row.get(4)?,
        details: row.get(5)?,
    })
}

/// Append an event for the store at `store_path`, keyed by its file name.
/// Never fails the calling command.
pub fn log_audit(store_path: &Path, op: &str, item_id: Option<u32>, details: Option<&str>) {
    if let Some(audit) = AuditLog::open(store_path) {
        let store = store_path
            .file_name()
            .map_or_else(|| store_path.display().to_string(), |n| n.to_string_lossy().into_owned());
        audit.log(op, &store, item_id, details);
    }
}
