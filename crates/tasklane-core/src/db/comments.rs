//! Comment rows. `task_id` is a plain reference; comments are never removed
//! when their task is.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use super::tasks::to_count;
use crate::model::{CommentId, NewComment, TaskComment, TaskId};

const COMMENT_COLUMNS: &str = "id, task_id, user_id, content, created_at_ms, updated_at_ms";

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskComment> {
    Ok(TaskComment {
        id: row.get(0)?,
        task_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn collect(rows: impl Iterator<Item = rusqlite::Result<TaskComment>>) -> Result<Vec<TaskComment>> {
    let mut comments = Vec::new();
    for row in rows {
        comments.push(row.context("read comment row")?);
    }
    Ok(comments)
}

/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert(conn: &Connection, comment: &NewComment, now_ms: i64) -> Result<CommentId> {
    conn.execute(
        "INSERT INTO task_comments (task_id, user_id, content, created_at_ms, updated_at_ms)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![comment.task_id, comment.user_id, comment.content, now_ms],
    )
    .context("insert comment")?;
    Ok(CommentId(conn.last_insert_rowid()))
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get(conn: &Connection, id: CommentId) -> Result<Option<TaskComment>> {
    conn.query_row(
        &format!("SELECT {COMMENT_COLUMNS} FROM task_comments WHERE id = ?1"),
        [id],
        row_to_comment,
    )
    .optional()
    .with_context(|| format!("get comment {id}"))
}

/// Comments on a task, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_by_task(conn: &Connection, task_id: TaskId) -> Result<Vec<TaskComment>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM task_comments
             WHERE task_id = ?1
             ORDER BY created_at_ms ASC, id ASC"
        ))
        .context("prepare comments by task")?;
    let rows = stmt
        .query_map([task_id], row_to_comment)
        .context("execute comments by task")?;
    collect(rows)
}

/// The most recent comments on a task, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_by_task(
    conn: &Connection,
    task_id: TaskId,
    limit: usize,
) -> Result<Vec<TaskComment>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM task_comments
             WHERE task_id = ?1
             ORDER BY created_at_ms DESC, id DESC
             LIMIT ?2"
        ))
        .context("prepare recent comments")?;
    let rows = stmt
        .query_map(params![task_id, super::sql_limit(limit)], row_to_comment)
        .context("execute recent comments")?;
    collect(rows)
}

/// Comments written by a user, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_by_user(conn: &Connection, user_id: &str) -> Result<Vec<TaskComment>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM task_comments
             WHERE user_id = ?1
             ORDER BY created_at_ms DESC, id DESC"
        ))
        .context("prepare comments by user")?;
    let rows = stmt
        .query_map([user_id], row_to_comment)
        .context("execute comments by user")?;
    collect(rows)
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn count_by_task(conn: &Connection, task_id: TaskId) -> Result<u64> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM task_comments WHERE task_id = ?1",
            [task_id],
            |row| row.get(0),
        )
        .context("count comments by task")?;
    Ok(to_count(n))
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn count_by_user(conn: &Connection, user_id: &str) -> Result<u64> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM task_comments WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .context("count comments by user")?;
    Ok(to_count(n))
}

/// Replace the content and refresh `updated_at_ms`. Returns `false` if no
/// row has that id.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_content(
    conn: &Connection,
    id: CommentId,
    content: &str,
    now_ms: i64,
) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE task_comments SET content = ?1, updated_at_ms = ?2 WHERE id = ?3",
            params![content, now_ms, id],
        )
        .with_context(|| format!("update comment {id}"))?;
    Ok(changed > 0)
}

/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete(conn: &Connection, id: CommentId) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM task_comments WHERE id = ?1", [id])
        .with_context(|| format!("delete comment {id}"))?;
    Ok(changed > 0)
}
