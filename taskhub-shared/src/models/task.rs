/// Task model
///
/// A task belongs to exactly one project (fixed at creation) and is assigned
/// to one member of that project.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description VARCHAR(500) NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assigned_to UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Ordering
///
/// Status and priority order by [`TaskStatus::rank`] and
/// [`TaskPriority::rank`]. The `Ord` impls, the in-memory sort and the SQL
/// `ORDER BY` expressions all derive from those two functions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::user::UserSummary;

/// Error returned when parsing an unknown status or priority value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Task progress state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Pending,

    /// Someone is working on it
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    /// Every status, in rank order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Wire and database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Sort rank (pending < in-progress < completed)
    pub fn rank(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Completed => 2,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

impl PartialOrd for TaskStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TaskStatus {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Every priority, in rank order
    pub const ALL: [TaskPriority; 3] =
        [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    /// Wire and database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Sort rank (low < medium < high)
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::Low => 0,
            TaskPriority::Medium => 1,
            TaskPriority::High => 2,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

impl PartialOrd for TaskPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TaskPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// What needs doing (trimmed, never empty)
    pub description: String,

    /// Current status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Owning project (immutable)
    #[serde(rename = "project")]
    pub project_id: Uuid,

    /// Member of the project responsible for the task
    pub assigned_to: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project_id: Uuid,
    pub assigned_to: Uuid,
}

/// Partial update of a task
///
/// Only `Some` fields change. The owning project cannot be changed.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
}

impl UpdateTask {
    /// Whether the update leaves every field untouched
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
    }

    /// Writes the present fields onto `task`
    pub fn apply_to(self, task: &mut Task) {
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = assigned_to;
        }
    }
}

/// Task with its assignee resolved to a user summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    pub id: Uuid,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project: Uuid,
    /// `None` only if the assignee's account no longer exists
    pub assigned_to: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskDetails {
    /// Builds the details view from a task and its (possibly missing) assignee
    pub fn new(task: Task, assignee: Option<UserSummary>) -> Self {
        Self {
            id: task.id,
            description: task.description,
            status: task.status,
            priority: task.priority,
            project: task.project_id,
            assigned_to: assignee,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in-progress\"");
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"completed\"").unwrap(),
            TaskStatus::Completed
        );
        assert!(serde_json::from_str::<TaskStatus>("\"done\"").is_err());
    }

    #[test]
    fn test_status_from_str() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        let err = "en progreso".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown task status: en progreso");
    }

    #[test]
    fn test_priority_from_str() {
        for priority in TaskPriority::ALL {
            assert_eq!(priority.as_str().parse::<TaskPriority>().unwrap(), priority);
        }
        assert!("urgent".parse::<TaskPriority>().is_err());
        assert!("HIGH".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_ordering_follows_rank() {
        assert!(TaskStatus::Pending < TaskStatus::InProgress);
        assert!(TaskStatus::InProgress < TaskStatus::Completed);
        assert!(TaskPriority::Low < TaskPriority::Medium);
        assert!(TaskPriority::Medium < TaskPriority::High);

        let mut priorities = vec![TaskPriority::High, TaskPriority::Low, TaskPriority::Medium];
        priorities.sort();
        assert_eq!(priorities, TaskPriority::ALL.to_vec());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_update_task_apply() {
        let assignee = Uuid::new_v4();
        let mut task = Task {
            id: Uuid::new_v4(),
            description: "Write docs".to_string(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Low,
            project_id: Uuid::new_v4(),
            assigned_to: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let project_id = task.project_id;

        let update = UpdateTask {
            status: Some(TaskStatus::Completed),
            assigned_to: Some(assignee),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply_to(&mut task);

        assert_eq!(task.description, "Write docs");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.priority, TaskPriority::Low);
        assert_eq!(task.assigned_to, assignee);
        assert_eq!(task.project_id, project_id);
        assert!(UpdateTask::default().is_empty());
    }
}
