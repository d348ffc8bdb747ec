//! Task operations.

use serde_json::json;
use tracing::instrument;

use super::{Operation, RequestContext};
use crate::audit;
use crate::auth::require_owned;
use crate::db::{self, tasks::StatusCounts, tasks::TaskFilter};
use crate::error::ApiResult;
use crate::model::{
    ActivityAction, NewTask, Task, TaskActivity, TaskId, TaskPatch, TaskPriority, TaskStatus,
};
use crate::validate;

/// Fields accepted by [`create_task`]. New tasks always start `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<i64>,
}

impl CreateTask {
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: TaskPriority::Medium,
            due_date: None,
        }
    }
}

/// Fields accepted by [`update_task`]; `None` leaves a field unchanged.
///
/// A description that is blank after trimming clears the stored one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<i64>,
}

/// # Errors
///
/// Fails with `Unauthenticated`, `RateLimited`, `Validation`, or `Store`.
/// The audit row is written after the insert commits, so on `Store` the
/// task may already exist.
#[instrument(level = "debug", skip_all, fields(op = "createTask"))]
pub fn create_task(ctx: &RequestContext<'_>, input: CreateTask) -> ApiResult<TaskId> {
    let identity = ctx.begin(Operation::CreateTask)?;
    let now_ms = ctx.now_ms();

    let title = validate::check_title(&input.title)?;
    let description = validate::check_description(input.description.as_deref())?;
    let due_date = validate::check_due_date(input.due_date, now_ms)?;

    let task_id = db::tasks::insert(
        ctx.conn(),
        &NewTask {
            user_id: identity.to_string(),
            title: title.clone(),
            description,
            status: TaskStatus::Pending,
            priority: input.priority,
            due_date,
        },
        now_ms,
    )?;

    audit::record(
        ctx.conn(),
        task_id,
        identity.as_str(),
        ActivityAction::Created,
        Some(json!({ "title": title, "priority": input.priority })),
        now_ms,
    )?;

    tracing::info!(task_id = task_id.get(), user = identity.as_str(), "task created");
    Ok(task_id)
}

/// # Errors
///
/// Fails with `Unauthenticated`, `NotFound`, `Unauthorized`, or `Store`.
#[instrument(level = "debug", skip(ctx), fields(op = "getTask"))]
pub fn get_task(ctx: &RequestContext<'_>, id: TaskId) -> ApiResult<Task> {
    let identity = ctx.begin(Operation::GetTask)?;
    require_owned(db::tasks::get(ctx.conn(), id)?, id.get(), identity)
}

/// Merge the given fields into a task.
///
/// Setting status to `completed` from any other status stamps
/// `completed_at`; moving away from `completed` leaves it in place. The audit
/// action is `completed` whenever the requested status is `completed`.
///
/// # Errors
///
/// Fails with `Unauthenticated`, `RateLimited`, `NotFound`, `Unauthorized`,
/// `Validation`, or `Store`.
#[instrument(level = "debug", skip(ctx, input), fields(op = "updateTask"))]
pub fn update_task(ctx: &RequestContext<'_>, id: TaskId, input: UpdateTask) -> ApiResult<TaskId> {
    let identity = ctx.begin(Operation::UpdateTask)?;
    let existing = require_owned(db::tasks::get(ctx.conn(), id)?, id.get(), identity)?;
    let now_ms = ctx.now_ms();

    let patch = TaskPatch {
        title: input.title.as_deref().map(validate::check_title).transpose()?,
        description: input
            .description
            .as_deref()
            .map(|d| validate::check_description(Some(d)))
            .transpose()?,
        status: input.status,
        priority: input.priority,
        due_date: validate::check_due_date(input.due_date, now_ms)?,
        completed_at: (input.status == Some(TaskStatus::Completed)
            && !existing.status.is_completed())
        .then_some(now_ms),
    };

    db::tasks::patch(ctx.conn(), id, &patch, now_ms)?;

    let action = if input.status == Some(TaskStatus::Completed) {
        ActivityAction::Completed
    } else {
        ActivityAction::Updated
    };
    let metadata = serde_json::to_value(&patch).map_err(anyhow::Error::from)?;
    audit::record(ctx.conn(), id, identity.as_str(), action, Some(metadata), now_ms)?;

    tracing::info!(
        task_id = id.get(),
        user = identity.as_str(),
        action = action.as_str(),
        "task updated"
    );
    Ok(id)
}

/// Delete a task and its audit trail. Its comments are left in place.
///
/// # Errors
///
/// Fails with `Unauthenticated`, `RateLimited`, `NotFound`, `Unauthorized`,
/// or `Store`.
#[instrument(level = "debug", skip(ctx), fields(op = "deleteTask"))]
pub fn delete_task(ctx: &RequestContext<'_>, id: TaskId) -> ApiResult<TaskId> {
    let identity = ctx.begin(Operation::DeleteTask)?;
    let existing = require_owned(db::tasks::get(ctx.conn(), id)?, id.get(), identity)?;
    let now_ms = ctx.now_ms();

    audit::record(
        ctx.conn(),
        id,
        identity.as_str(),
        ActivityAction::Deleted,
        Some(audit::deleted_task_metadata(&existing.title)),
        now_ms,
    )?;
    db::tasks::delete(ctx.conn(), id)?;
    audit::purge_task(ctx.conn(), id)?;

    tracing::info!(task_id = id.get(), user = identity.as_str(), "task deleted");
    Ok(id)
}

fn list_with(ctx: &RequestContext<'_>, op: Operation, filter: &TaskFilter) -> ApiResult<Vec<Task>> {
    let identity = ctx.begin(op)?;
    Ok(db::tasks::list_by_user(ctx.conn(), identity.as_str(), filter)?)
}

/// The caller's tasks, newest first.
///
/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn list_tasks(ctx: &RequestContext<'_>) -> ApiResult<Vec<Task>> {
    list_with(ctx, Operation::ListTasks, &TaskFilter::default())
}

/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn list_by_status(ctx: &RequestContext<'_>, status: TaskStatus) -> ApiResult<Vec<Task>> {
    list_with(
        ctx,
        Operation::ListTasksByStatus,
        &TaskFilter {
            status: Some(status),
            ..TaskFilter::default()
        },
    )
}

/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn list_by_priority(ctx: &RequestContext<'_>, priority: TaskPriority) -> ApiResult<Vec<Task>> {
    list_with(
        ctx,
        Operation::ListTasksByPriority,
        &TaskFilter {
            priority: Some(priority),
            ..TaskFilter::default()
        },
    )
}

/// Open tasks past their due date, soonest due first.
///
/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn list_overdue(ctx: &RequestContext<'_>) -> ApiResult<Vec<Task>> {
    let identity = ctx.begin(Operation::ListOverdueTasks)?;
    Ok(db::tasks::list_overdue(ctx.conn(), identity.as_str(), ctx.now_ms())?)
}

/// Open tasks due within the next seven days, soonest due first.
///
/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn list_upcoming(ctx: &RequestContext<'_>) -> ApiResult<Vec<Task>> {
    let identity = ctx.begin(Operation::ListUpcomingTasks)?;
    Ok(db::tasks::list_upcoming(ctx.conn(), identity.as_str(), ctx.now_ms())?)
}

/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn task_stats(ctx: &RequestContext<'_>) -> ApiResult<StatusCounts> {
    let identity = ctx.begin(Operation::TaskStats)?;
    Ok(db::tasks::count_by_status(ctx.conn(), identity.as_str())?)
}

/// A task's audit trail, oldest first.
///
/// For a task that no longer exists, only the caller's own entries are
/// returned, which is empty once the deletion has purged them.
///
/// # Errors
///
/// Fails with `Unauthenticated`, `Unauthorized`, or `Store`.
#[instrument(level = "debug", skip(ctx), fields(op = "taskHistory"))]
pub fn task_history(ctx: &RequestContext<'_>, id: TaskId) -> ApiResult<Vec<TaskActivity>> {
    let identity = ctx.begin(Operation::TaskHistory)?;
    match db::tasks::get(ctx.conn(), id)? {
        Some(task) => {
            crate::auth::assert_owner(&task, identity)?;
            Ok(audit::by_task(ctx.conn(), id)?)
        }
        None => {
            let mut entries = audit::by_task(ctx.conn(), id)?;
            entries.retain(|entry| entry.user_id == identity.as_str());
            Ok(entries)
        }
    }
}
