use serde::{Deserialize, Serialize};

use super::row_id;
use super::task::TaskId;

row_id!(
    /// Primary key of a row in `task_comments`.
    CommentId
);

/// A note attached to a task by its owner.
///
/// `task_id` is not a foreign key: deleting the parent task leaves its
/// comments in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub user_id: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub task_id: TaskId,
    pub user_id: String,
    pub content: String,
}
