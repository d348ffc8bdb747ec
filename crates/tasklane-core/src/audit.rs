//! Audit trail: one activity row appended after each successful task or
//! comment mutation.
//!
//! The mutation and its audit row are separate writes. If the append fails
//! the mutation stays committed and the failure is returned to the caller.

use anyhow::Result;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::db;
use crate::model::{ActivityAction, ActivityId, CommentId, TaskActivity, TaskId};

/// Length of the comment excerpt kept in audit metadata.
pub const PREVIEW_CHARS: usize = 100;
pub const DEFAULT_RECENT_BY_TASK: usize = 10;
pub const DEFAULT_RECENT_BY_USER: usize = 20;

/// Append one entry.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn record(
    conn: &Connection,
    task_id: TaskId,
    user_id: &str,
    action: ActivityAction,
    metadata: Option<Value>,
    now_ms: i64,
) -> Result<ActivityId> {
    match db::activity::insert(conn, task_id, user_id, action, metadata.as_ref(), now_ms) {
        Ok(id) => {
            tracing::debug!(
                task_id = task_id.get(),
                user = user_id,
                action = action.as_str(),
                activity_id = id.get(),
                "audit entry recorded"
            );
            Ok(id)
        }
        Err(err) => {
            tracing::warn!(
                task_id = task_id.get(),
                user = user_id,
                action = action.as_str(),
                error = %format!("{err:#}"),
                "audit append failed after mutation"
            );
            Err(err)
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of a comment.
#[must_use]
pub fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

#[must_use]
pub fn deleted_task_metadata(title: &str) -> Value {
    json!({ "title": title })
}

#[must_use]
pub fn comment_metadata(comment_id: CommentId, content: &str) -> Value {
    json!({ "commentId": comment_id, "preview": preview(content) })
}

#[must_use]
pub fn comment_removed_metadata(comment_id: CommentId) -> Value {
    json!({ "commentId": comment_id })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn by_task(conn: &Connection, task_id: TaskId) -> Result<Vec<TaskActivity>> {
    db::activity::by_task(conn, task_id)
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn by_user(
    conn: &Connection,
    user_id: &str,
    limit: Option<usize>,
) -> Result<Vec<TaskActivity>> {
    db::activity::by_user(conn, user_id, limit)
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_by_task(
    conn: &Connection,
    task_id: TaskId,
    limit: Option<usize>,
) -> Result<Vec<TaskActivity>> {
    db::activity::recent_by_task(conn, task_id, limit.unwrap_or(DEFAULT_RECENT_BY_TASK))
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_by_user(
    conn: &Connection,
    user_id: &str,
    limit: Option<usize>,
) -> Result<Vec<TaskActivity>> {
    db::activity::recent_by_user(conn, user_id, limit.unwrap_or(DEFAULT_RECENT_BY_USER))
}

/// Remove a task's whole trail. Used when the task itself is deleted.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn purge_task(conn: &Connection, task_id: TaskId) -> Result<usize> {
    let removed = db::activity::delete_by_task(conn, task_id)?;
    tracing::debug!(task_id = task_id.get(), removed, "activity purged");
    Ok(removed)
}
