use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AgentType, ExecutionStatus};
use crate::workflow::{Stateful, WorkflowStatus};

/// One attempt at running a task through an agent.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TaskExecution {
    pub id: String,
    pub task_id: String,
    pub attempt_number: i64,
    pub status: ExecutionStatus,
    pub agent_type: AgentType,
    /// Correlation id of the external job.
    pub job_id: Option<String>,
    pub logs: String,
    pub output: Option<serde_json::Value>,
    pub metrics: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskExecution {
    #[must_use]
    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_seconds()),
            _ => None,
        }
    }
}

impl Stateful for TaskExecution {
    type Status = ExecutionStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> ExecutionStatus {
        self.status
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply_status(
        &mut self,
        next: ExecutionStatus,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) {
        if next == ExecutionStatus::Running {
            self.started_at = Some(now);
        } else if next.is_terminal() {
            self.completed_at = Some(now);
        }
        self.status = next;
        self.error_message = error_message;
        self.version += 1;
        self.updated_at = now;
    }
}
