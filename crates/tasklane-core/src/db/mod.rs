//! SQLite-backed domain store.
//!
//! The submodules are the only code that issues SQL. Each exposes free
//! functions over a borrowed [`Connection`]; lookups by id return
//! `Ok(None)` for a missing row rather than an error.
//!
//! Connections are configured with:
//! - `journal_mode = WAL` so readers do not block the writer
//! - `busy_timeout = 5s` so concurrent CLI processes wait instead of failing
//! - `foreign_keys = ON`
//! - `synchronous = NORMAL`

pub mod activity;
pub mod comments;
pub mod migrations;
pub mod preferences;
pub mod schema;
pub mod tasks;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the store at `path`, apply pragmas, and migrate it to
/// the latest schema.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or opening,
/// configuring, or migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open store {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;

    Ok(conn)
}

/// Open an existing store without creating it.
///
/// Returns `Ok(None)` when no file exists at `path`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be opened or migrated.
pub fn try_open_store(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }
    open_store(path).map(Some)
}

/// Fresh in-memory store with the full schema; used by tests and tooling.
///
/// # Errors
///
/// Returns an error if migrating the in-memory database fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory store")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;
    Ok(conn)
}

pub(crate) fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// Convert a caller-supplied row limit into an SQLite `LIMIT` value.
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
