//! Task rows.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::ToSql};
use serde::Serialize;

use crate::clock::ONE_WEEK_MS;
use crate::model::{NewTask, Task, TaskId, TaskPatch, TaskPriority, TaskStatus};

const TASK_COLUMNS: &str = "id, user_id, title, description, status, priority, \
     due_date_ms, completed_at_ms, created_at_ms, updated_at_ms";

/// Optional narrowing for [`list_by_user`]. Results are always newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub limit: Option<usize>,
}

/// Task counts for one owner, by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
}

/// Counts of not-yet-completed tasks, by priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

pub(crate) fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        due_date: row.get(6)?,
        completed_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Insert a task stamped with `now_ms` for both created and updated time.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert(conn: &Connection, task: &NewTask, now_ms: i64) -> Result<TaskId> {
    let completed_at = task.status.is_completed().then_some(now_ms);
    conn.execute(
        "INSERT INTO tasks (user_id, title, description, status, priority,
                            due_date_ms, completed_at_ms, created_at_ms, updated_at_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            task.user_id,
            task.title,
            task.description,
            task.status,
            task.priority,
            task.due_date,
            completed_at,
            now_ms,
        ],
    )
    .context("insert task")?;
    Ok(TaskId(conn.last_insert_rowid()))
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get(conn: &Connection, id: TaskId) -> Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        [id],
        row_to_task,
    )
    .optional()
    .with_context(|| format!("get task {id}"))
}

/// Tasks owned by `user_id`, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_by_user(conn: &Connection, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1");
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.to_string())];

    if let Some(status) = filter.status {
        values.push(Box::new(status));
        let _ = write!(sql, " AND status = ?{}", values.len());
    }
    if let Some(priority) = filter.priority {
        values.push(Box::new(priority));
        let _ = write!(sql, " AND priority = ?{}", values.len());
    }
    sql.push_str(" ORDER BY created_at_ms DESC, id DESC");
    if let Some(limit) = filter.limit {
        let _ = write!(sql, " LIMIT {}", super::sql_limit(limit));
    }

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare list tasks query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter().map(AsRef::as_ref)), row_to_task)
        .context("execute list tasks query")?;
    collect_tasks(rows)
}

/// Open tasks whose due date has passed: `due < now`, status not completed,
/// soonest due first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_overdue(conn: &Connection, user_id: &str, now_ms: i64) -> Result<Vec<Task>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = ?1 AND due_date_ms < ?2 AND status <> 'completed'
             ORDER BY due_date_ms ASC, id ASC"
        ))
        .context("prepare overdue scan")?;
    let rows = stmt
        .query_map(params![user_id, now_ms], row_to_task)
        .context("execute overdue scan")?;
    collect_tasks(rows)
}

/// Open tasks due within the next week: `now <= due <= now + 7d`, status
/// not completed, soonest due first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_upcoming(conn: &Connection, user_id: &str, now_ms: i64) -> Result<Vec<Task>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = ?1 AND due_date_ms BETWEEN ?2 AND ?3 AND status <> 'completed'
             ORDER BY due_date_ms ASC, id ASC"
        ))
        .context("prepare upcoming scan")?;
    let rows = stmt
        .query_map(params![user_id, now_ms, now_ms + ONE_WEEK_MS], row_to_task)
        .context("execute upcoming scan")?;
    collect_tasks(rows)
}

fn collect_tasks(rows: impl Iterator<Item = rusqlite::Result<Task>>) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row.context("read task row")?);
    }
    Ok(tasks)
}

/// Merge `patch` into the row and refresh `updated_at_ms`. Performs no
/// validation. Returns `false` if no row has that id.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn patch(conn: &Connection, id: TaskId, patch: &TaskPatch, now_ms: i64) -> Result<bool> {
    let mut assignments = vec!["updated_at_ms = ?1".to_string()];
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(now_ms)];

    let mut set = |column: &str, value: Box<dyn ToSql>| {
        values.push(value);
        assignments.push(format!("{column} = ?{}", values.len()));
    };
    if let Some(title) = &patch.title {
        set("title", Box::new(title.clone()));
    }
    if let Some(description) = &patch.description {
        set("description", Box::new(description.clone()));
    }
    if let Some(status) = patch.status {
        set("status", Box::new(status));
    }
    if let Some(priority) = patch.priority {
        set("priority", Box::new(priority));
    }
    if let Some(due_date) = patch.due_date {
        set("due_date_ms", Box::new(due_date));
    }
    if let Some(completed_at) = patch.completed_at {
        set("completed_at_ms", Box::new(completed_at));
    }

    values.push(Box::new(id));
    let sql = format!(
        "UPDATE tasks SET {} WHERE id = ?{}",
        assignments.join(", "),
        values.len()
    );
    let changed = conn
        .execute(&sql, params_from_iter(values.iter().map(AsRef::as_ref)))
        .with_context(|| format!("patch task {id}"))?;
    Ok(changed > 0)
}

/// Delete the task row only. Comments and activity are left to the caller.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete(conn: &Connection, id: TaskId) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM tasks WHERE id = ?1", [id])
        .with_context(|| format!("delete task {id}"))?;
    Ok(changed > 0)
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn count_by_status(conn: &Connection, user_id: &str) -> Result<StatusCounts> {
    let mut stmt = conn
        .prepare("SELECT status, COUNT(*) FROM tasks WHERE user_id = ?1 GROUP BY status")
        .context("prepare status counts")?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok((row.get::<_, TaskStatus>(0)?, row.get::<_, i64>(1)?))
        })
        .context("execute status counts")?;

    let mut counts = StatusCounts::default();
    for row in rows {
        let (status, n) = row.context("read status count")?;
        let n = to_count(n);
        counts.total += n;
        match status {
            TaskStatus::Pending => counts.pending = n,
            TaskStatus::InProgress => counts.in_progress = n,
            TaskStatus::Completed => counts.completed = n,
        }
    }
    Ok(counts)
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn count_open_by_priority(conn: &Connection, user_id: &str) -> Result<PriorityCounts> {
    let mut stmt = conn
        .prepare(
            "SELECT priority, COUNT(*) FROM tasks
             WHERE user_id = ?1 AND status <> 'completed'
             GROUP BY priority",
        )
        .context("prepare priority counts")?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok((row.get::<_, TaskPriority>(0)?, row.get::<_, i64>(1)?))
        })
        .context("execute priority counts")?;

    let mut counts = PriorityCounts::default();
    for row in rows {
        let (priority, n) = row.context("read priority count")?;
        match priority {
            TaskPriority::Low => counts.low = to_count(n),
            TaskPriority::Medium => counts.medium = to_count(n),
            TaskPriority::High => counts.high = to_count(n),
        }
    }
    Ok(counts)
}

/// Number of the user's tasks completed at or after `since_ms`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_completed_since(conn: &Connection, user_id: &str, since_ms: i64) -> Result<u64> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM tasks
             WHERE user_id = ?1 AND completed_at_ms >= ?2",
            params![user_id, since_ms],
            |row| row.get(0),
        )
        .context("count recent completions")?;
    Ok(to_count(n))
}
