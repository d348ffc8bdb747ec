//! Append-only activity rows. Nothing here updates an existing row.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use super::tasks::to_count;
use crate::model::{ActivityAction, ActivityId, TaskActivity, TaskId};

const ACTIVITY_COLUMNS: &str = "id, task_id, user_id, action, metadata_json, created_at_ms";

fn row_to_activity(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskActivity> {
    let metadata_json: Option<String> = row.get(4)?;
    let metadata = metadata_json
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
        })?;
    Ok(TaskActivity {
        id: row.get(0)?,
        task_id: row.get(1)?,
        user_id: row.get(2)?,
        action: row.get(3)?,
        metadata,
        created_at: row.get(5)?,
    })
}

fn query(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> Result<Vec<TaskActivity>> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("prepare activity query: {sql}"))?;
    let rows = stmt
        .query_map(args, row_to_activity)
        .context("execute activity query")?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.context("read activity row")?);
    }
    Ok(entries)
}

/// Append one entry.
///
/// # Errors
///
/// Returns an error if the metadata cannot be serialized or the insert fails.
pub fn insert(
    conn: &Connection,
    task_id: TaskId,
    user_id: &str,
    action: ActivityAction,
    metadata: Option<&serde_json::Value>,
    now_ms: i64,
) -> Result<ActivityId> {
    let metadata_json = metadata
        .map(serde_json::to_string)
        .transpose()
        .context("serialize activity metadata")?;
    conn.execute(
        "INSERT INTO task_activity (task_id, user_id, action, metadata_json, created_at_ms)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![task_id, user_id, action, metadata_json, now_ms],
    )
    .with_context(|| format!("record {action} activity for task {task_id}"))?;
    Ok(ActivityId(conn.last_insert_rowid()))
}

/// Full history of a task, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn by_task(conn: &Connection, task_id: TaskId) -> Result<Vec<TaskActivity>> {
    query(
        conn,
        &format!(
            "SELECT {ACTIVITY_COLUMNS} FROM task_activity
             WHERE task_id = ?1 ORDER BY created_at_ms ASC, id ASC"
        ),
        [task_id],
    )
}

/// The latest `limit` entries for a task, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_by_task(
    conn: &Connection,
    task_id: TaskId,
    limit: usize,
) -> Result<Vec<TaskActivity>> {
    query(
        conn,
        &format!(
            "SELECT {ACTIVITY_COLUMNS} FROM task_activity
             WHERE task_id = ?1 ORDER BY created_at_ms DESC, id DESC LIMIT ?2"
        ),
        params![task_id, super::sql_limit(limit)],
    )
}

/// Everything a user did, newest first, optionally capped.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn by_user(
    conn: &Connection,
    user_id: &str,
    limit: Option<usize>,
) -> Result<Vec<TaskActivity>> {
    let mut sql = format!(
        "SELECT {ACTIVITY_COLUMNS} FROM task_activity
         WHERE user_id = ?1 ORDER BY created_at_ms DESC, id DESC"
    );
    if let Some(limit) = limit {
        let _ = write!(sql, " LIMIT {}", super::sql_limit(limit));
    }
    query(conn, &sql, [user_id])
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_by_user(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<TaskActivity>> {
    by_user(conn, user_id, Some(limit))
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn count_by_user(conn: &Connection, user_id: &str) -> Result<u64> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM task_activity WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .context("count activity by user")?;
    Ok(to_count(n))
}

/// Remove every entry for a task. Returns the number of rows removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_by_task(conn: &Connection, task_id: TaskId) -> Result<usize> {
    conn.execute("DELETE FROM task_activity WHERE task_id = ?1", [task_id])
        .with_context(|| format!("purge activity for task {task_id}"))
}
