//! Audit-trail rows.

use serde::{Deserialize, Serialize};

use super::task::TaskId;
use super::{row_id, text_enum};

row_id!(
    /// Primary key of a row in `task_activity`.
    ActivityId
);

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Created,
    Updated,
    Completed,
    Deleted,
    Commented,
}

impl ActivityAction {
    pub const ALL: [Self; 5] = [
        Self::Created,
        Self::Updated,
        Self::Completed,
        Self::Deleted,
        Self::Commented,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
            Self::Commented => "commented",
        }
    }
}

text_enum!(ActivityAction, "activity action");

/// One append-only audit entry. Never patched after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskActivity {
    pub id: ActivityId,
    pub task_id: TaskId,
    pub user_id: String,
    pub action: ActivityAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: i64,
}
