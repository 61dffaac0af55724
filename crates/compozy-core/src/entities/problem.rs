use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Priority, ProblemStatus};
use crate::progress;
use crate::workflow::Stateful;

/// A feature or issue request moving through the analysis-to-delivery workflow.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Problem {
    pub id: String,
    pub organization_id: String,
    pub created_by: Option<String>,
    pub title: String,
    pub description: String,
    pub status: ProblemStatus,
    pub priority: Priority,
    /// Ids of linked repositories. Loaded by the store, not a column.
    #[serde(default)]
    pub repository_ids: Vec<String>,
    pub workflow_id: Option<String>,
    pub error_message: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    #[must_use]
    pub const fn progress_percentage(&self) -> u8 {
        progress::progress_percentage(self.status)
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        progress::is_active(self.status)
    }

    #[must_use]
    pub const fn is_awaiting_review(&self) -> bool {
        progress::is_awaiting_review(self.status)
    }
}

impl Stateful for Problem {
    type Status = ProblemStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> ProblemStatus {
        self.status
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply_status(
        &mut self,
        next: ProblemStatus,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = next;
        self.error_message = error_message;
        self.version += 1;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Problem {
        let now = Utc::now();
        Problem {
            id: "prb-1".into(),
            organization_id: "org-1".into(),
            created_by: None,
            title: "Add SSO".into(),
            description: String::new(),
            status: ProblemStatus::Draft,
            priority: Priority::High,
            repository_ids: Vec::new(),
            workflow_id: None,
            error_message: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn transitioned_bumps_version_and_leaves_original() {
        let p = draft();
        let next = p
            .transitioned(ProblemStatus::Analyzing, None, Utc::now())
            .unwrap();
        assert_eq!(next.status, ProblemStatus::Analyzing);
        assert_eq!(next.version, 2);
        assert_eq!(p.status, ProblemStatus::Draft);
        assert_eq!(next.progress_percentage(), 10);
    }

    #[test]
    fn reopen_clears_error() {
        let mut p = draft();
        p.status = ProblemStatus::Analyzing;
        let failed = p
            .transitioned(ProblemStatus::Failed, Some("boom"), Utc::now())
            .unwrap();
        assert_eq!(failed.error_message.as_deref(), Some("boom"));
        assert!(!failed.is_active());

        let reopened = failed
            .transitioned(ProblemStatus::Draft, Some("ignored"), Utc::now())
            .unwrap();
        assert_eq!(reopened.error_message, None);
        assert_eq!(reopened.version, 3);
    }

    #[test]
    fn rejected_edge_reports_error() {
        let mut p = draft();
        p.status = ProblemStatus::PrdGeneration;
        let err = p
            .transitioned(ProblemStatus::Draft, None, Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("prd_generation"));
    }
}
