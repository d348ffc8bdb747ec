use serde::{Deserialize, Serialize};

use super::{row_id, text_enum};

row_id!(
    /// Primary key of a row in `tasks`.
    TaskId
);

/// Task lifecycle status. Any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

text_enum!(TaskStatus, "task status");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

text_enum!(TaskPriority, "task priority");

/// A stored task row. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<i64>,
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields for inserting a task; timestamps are stamped by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<i64>,
}

/// Partial update merged into an existing task.
///
/// `description: Some(None)` clears the description. The serialized form is
/// the metadata snapshot recorded in the audit trail, so unset fields are
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl TaskPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.completed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in TaskStatus::ALL {
            let parsed: TaskStatus = status.as_str().parse().expect("parse status");
            assert_eq!(parsed, status);
        }
        assert_eq!("IN_PROGRESS".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
    }

    #[test]
    fn unknown_priority_is_rejected_with_context() {
        let err = "urgent".parse::<TaskPriority>().expect_err("not a priority");
        assert_eq!(err.to_string(), "invalid task priority: 'urgent'");
    }

    #[test]
    fn patch_snapshot_omits_unset_fields() {
        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            completed_at: Some(42),
            ..TaskPatch::default()
        };
        let snapshot = serde_json::to_value(&patch).expect("serialize patch");
        assert_eq!(
            snapshot,
            serde_json::json!({ "status": "completed", "completedAt": 42 })
        );
    }

    #[test]
    fn clearing_description_serializes_as_null() {
        let patch = TaskPatch {
            description: Some(None),
            ..TaskPatch::default()
        };
        let snapshot = serde_json::to_value(&patch).expect("serialize patch");
        assert_eq!(snapshot, serde_json::json!({ "description": null }));
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());
    }
}
