use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Priority, TaskStatus};
use crate::workflow::Stateful;

/// A unit of implementation work belonging to exactly one problem.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub problem_id: String,
    pub title: String,
    pub description: String,
    /// Implementation notes handed to the executing agent.
    pub spec: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub order_index: i64,
    /// Ids of tasks in the same problem that must finish first.
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whole seconds between start and completion, when both are known.
    #[must_use]
    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_seconds()),
            _ => None,
        }
    }
}

impl Stateful for Task {
    type Status = TaskStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply_status(&mut self, next: TaskStatus, error_message: Option<String>, now: DateTime<Utc>) {
        match next {
            TaskStatus::InProgress => {
                self.started_at.get_or_insert(now);
            }
            TaskStatus::Completed | TaskStatus::Failed => self.completed_at = Some(now),
            TaskStatus::Pending => {
                self.started_at = None;
                self.completed_at = None;
            }
            TaskStatus::Selected | TaskStatus::Testing | TaskStatus::Skipped => {}
        }
        self.status = next;
        self.error_message = error_message;
        self.version += 1;
        self.updated_at = now;
    }
}
