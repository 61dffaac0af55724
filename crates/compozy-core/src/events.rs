//! Workflow event records delivered to listeners.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityType, EventKind};
use crate::workflow::WorkflowStatus;

/// A creation or status change of a Problem, Task or `TaskExecution`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct WorkflowEvent {
    pub kind: EventKind,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub old_status: Option<String>,
    pub new_status: String,
    pub timestamp: DateTime<Utc>,
    pub actor: Option<String>,
    pub reason: Option<String>,
}

impl WorkflowEvent {
    #[must_use]
    pub fn created<S: WorkflowStatus>(
        entity_id: &str,
        status: S,
        actor: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: EventKind::Created,
            entity_type: S::ENTITY,
            entity_id: entity_id.to_string(),
            old_status: None,
            new_status: status.code().to_string(),
            timestamp,
            actor: actor.map(String::from),
            reason: None,
        }
    }

    /// Status change event. Kind is `failed` when `to` is a failure status.
    #[must_use]
    pub fn transition<S: WorkflowStatus>(
        entity_id: &str,
        from: S,
        to: S,
        actor: Option<&str>,
        reason: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: to.event_kind(),
            entity_type: S::ENTITY,
            entity_id: entity_id.to_string(),
            old_status: Some(from.code().to_string()),
            new_status: to.code().to_string(),
            timestamp,
            actor: actor.map(String::from),
            reason: reason.map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{ExecutionStatus, ProblemStatus};

    #[test]
    fn failure_target_yields_failed_kind() {
        let e = WorkflowEvent::transition(
            "exe-1",
            ExecutionStatus::Running,
            ExecutionStatus::Timeout,
            None,
            Some("worker lost"),
            Utc::now(),
        );
        assert_eq!(e.kind, EventKind::Failed);
        assert_eq!(e.entity_type, EntityType::Execution);
        assert_eq!(e.old_status.as_deref(), Some("running"));
    }

    #[test]
    fn created_has_no_old_status() {
        let e = WorkflowEvent::created("prb-1", ProblemStatus::Draft, Some("u-1"), Utc::now());
        assert_eq!(e.kind, EventKind::Created);
        assert_eq!(e.old_status, None);
        assert_eq!(e.new_status, "draft");
    }
}
