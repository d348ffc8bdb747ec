//! Comment operations. Comments are written by the owner of their task.

use serde_json::Value;
use tracing::instrument;

use super::{Operation, RequestContext};
use crate::audit;
use crate::auth::require_owned;
use crate::db;
use crate::error::ApiResult;
use crate::model::{ActivityAction, CommentId, NewComment, TaskComment, TaskId};
use crate::validate;

pub const DEFAULT_RECENT_COMMENTS: usize = 5;

/// # Errors
///
/// Fails with `Unauthenticated`, `RateLimited`, `NotFound` (task),
/// `Unauthorized`, `Validation`, or `Store`.
#[instrument(level = "debug", skip(ctx, content), fields(op = "createComment"))]
pub fn create_comment(
    ctx: &RequestContext<'_>,
    task_id: TaskId,
    content: &str,
) -> ApiResult<CommentId> {
    let identity = ctx.begin(Operation::CreateComment)?;
    require_owned(db::tasks::get(ctx.conn(), task_id)?, task_id.get(), identity)?;
    let content = validate::check_comment(content)?;
    let now_ms = ctx.now_ms();

    let comment_id = db::comments::insert(
        ctx.conn(),
        &NewComment {
            task_id,
            user_id: identity.to_string(),
            content: content.clone(),
        },
        now_ms,
    )?;

    audit::record(
        ctx.conn(),
        task_id,
        identity.as_str(),
        ActivityAction::Commented,
        Some(audit::comment_metadata(comment_id, &content)),
        now_ms,
    )?;

    tracing::info!(
        comment_id = comment_id.get(),
        task_id = task_id.get(),
        user = identity.as_str(),
        "comment created"
    );
    Ok(comment_id)
}

/// # Errors
///
/// Fails with `Unauthenticated`, `NotFound`, `Unauthorized`, or `Store`.
pub fn get_comment(ctx: &RequestContext<'_>, id: CommentId) -> ApiResult<TaskComment> {
    let identity = ctx.begin(Operation::GetComment)?;
    require_owned(db::comments::get(ctx.conn(), id)?, id.get(), identity)
}

/// Replace a comment's content. Audited as `updated` on the parent task
/// while that task still exists.
///
/// # Errors
///
/// Fails with `Unauthenticated`, `RateLimited`, `NotFound`, `Unauthorized`,
/// `Validation`, or `Store`.
#[instrument(level = "debug", skip(ctx, content), fields(op = "updateComment"))]
pub fn update_comment(
    ctx: &RequestContext<'_>,
    id: CommentId,
    content: &str,
) -> ApiResult<CommentId> {
    let identity = ctx.begin(Operation::UpdateComment)?;
    let existing = require_owned(db::comments::get(ctx.conn(), id)?, id.get(), identity)?;
    let content = validate::check_comment(content)?;
    let now_ms = ctx.now_ms();

    db::comments::update_content(ctx.conn(), id, &content, now_ms)?;
    record_on_parent(
        ctx,
        &existing,
        ActivityAction::Updated,
        audit::comment_metadata(id, &content),
        now_ms,
    )?;

    tracing::info!(comment_id = id.get(), user = identity.as_str(), "comment updated");
    Ok(id)
}

/// Remove a comment. Audited as `deleted` on the parent task while that
/// task still exists.
///
/// # Errors
///
/// Fails with `Unauthenticated`, `RateLimited`, `NotFound`, `Unauthorized`,
/// or `Store`.
#[instrument(level = "debug", skip(ctx), fields(op = "deleteComment"))]
pub fn delete_comment(ctx: &RequestContext<'_>, id: CommentId) -> ApiResult<CommentId> {
    let identity = ctx.begin(Operation::DeleteComment)?;
    let existing = require_owned(db::comments::get(ctx.conn(), id)?, id.get(), identity)?;
    let now_ms = ctx.now_ms();

    db::comments::delete(ctx.conn(), id)?;
    record_on_parent(
        ctx,
        &existing,
        ActivityAction::Deleted,
        audit::comment_removed_metadata(id),
        now_ms,
    )?;

    tracing::info!(comment_id = id.get(), user = identity.as_str(), "comment deleted");
    Ok(id)
}

/// Append an activity row for a comment change to its task. Comments outlive
/// their task, and a deleted task keeps no history.
fn record_on_parent(
    ctx: &RequestContext<'_>,
    comment: &TaskComment,
    action: ActivityAction,
    metadata: Value,
    now_ms: i64,
) -> ApiResult<()> {
    if db::tasks::get(ctx.conn(), comment.task_id)?.is_none() {
        tracing::debug!(
            comment_id = comment.id.get(),
            task_id = comment.task_id.get(),
            action = action.as_str(),
            "parent task is gone, activity not recorded"
        );
        return Ok(());
    }
    audit::record(
        ctx.conn(),
        comment.task_id,
        &comment.user_id,
        action,
        Some(metadata),
        now_ms,
    )?;
    Ok(())
}

/// Comments on one of the caller's tasks, oldest first.
///
/// # Errors
///
/// Fails with `Unauthenticated`, `NotFound`, `Unauthorized`, or `Store`.
pub fn list_comments_by_task(
    ctx: &RequestContext<'_>,
    task_id: TaskId,
) -> ApiResult<Vec<TaskComment>> {
    let identity = ctx.begin(Operation::ListCommentsByTask)?;
    require_owned(db::tasks::get(ctx.conn(), task_id)?, task_id.get(), identity)?;
    Ok(db::comments::list_by_task(ctx.conn(), task_id)?)
}

/// The latest comments on a task, newest first. `limit` defaults to
/// [`DEFAULT_RECENT_COMMENTS`].
///
/// # Errors
///
/// Fails with `Unauthenticated`, `NotFound`, `Unauthorized`, or `Store`.
pub fn list_recent_comments(
    ctx: &RequestContext<'_>,
    task_id: TaskId,
    limit: Option<usize>,
) -> ApiResult<Vec<TaskComment>> {
    let identity = ctx.begin(Operation::ListRecentComments)?;
    require_owned(db::tasks::get(ctx.conn(), task_id)?, task_id.get(), identity)?;
    Ok(db::comments::recent_by_task(
        ctx.conn(),
        task_id,
        limit.unwrap_or(DEFAULT_RECENT_COMMENTS),
    )?)
}

/// # Errors
///
/// Fails with `Unauthenticated`, `NotFound`, `Unauthorized`, or `Store`.
pub fn get_comment_count(ctx: &RequestContext<'_>, task_id: TaskId) -> ApiResult<u64> {
    let identity = ctx.begin(Operation::GetCommentCount)?;
    require_owned(db::tasks::get(ctx.conn(), task_id)?, task_id.get(), identity)?;
    Ok(db::comments::count_by_task(ctx.conn(), task_id)?)
}
