//! Generic state machine over the status enums.
//!
//! `WorkflowStatus` abstracts the per-enum adjacency tables so the store can
//! drive Problem, Task and `TaskExecution` transitions through one code path.
//! `Stateful` is implemented by entities that carry such a status and knows
//! how to compute the post-transition entity without touching storage.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

use crate::enums::{EntityType, EventKind, ExecutionStatus, ProblemStatus, TaskStatus};
use crate::errors::CoreError;

/// A closed status enum with an explicit adjacency table.
pub trait WorkflowStatus:
    Copy + Eq + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Entity type whose status this is.
    const ENTITY: EntityType;

    /// Every variant, in declaration order.
    fn variants() -> &'static [Self];

    /// Outgoing edges of this status.
    fn next_states(self) -> &'static [Self];

    /// Storage / wire name.
    fn code(self) -> &'static str;

    /// Whether entering this status means the work failed.
    fn is_failure(self) -> bool;

    fn permits(self, next: Self) -> bool {
        self.next_states().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.next_states().is_empty() || self.is_failure()
    }

    /// Event kind emitted when an entity enters this status.
    fn event_kind(self) -> EventKind {
        if self.is_failure() {
            EventKind::Failed
        } else {
            EventKind::Transitioned
        }
    }
}

impl WorkflowStatus for ProblemStatus {
    const ENTITY: EntityType = EntityType::Problem;

    fn variants() -> &'static [Self] {
        &Self::ALL
    }

    fn next_states(self) -> &'static [Self] {
        self.allowed_next_states()
    }

    fn code(self) -> &'static str {
        self.as_str()
    }

    fn is_failure(self) -> bool {
        self == Self::Failed
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl WorkflowStatus for TaskStatus {
    const ENTITY: EntityType = EntityType::Task;

    fn variants() -> &'static [Self] {
        &Self::ALL
    }

    fn next_states(self) -> &'static [Self] {
        self.allowed_next_states()
    }

    fn code(self) -> &'static str {
        self.as_str()
    }

    fn is_failure(self) -> bool {
        self == Self::Failed
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

impl WorkflowStatus for ExecutionStatus {
    const ENTITY: EntityType = EntityType::Execution;

    fn variants() -> &'static [Self] {
        &Self::ALL
    }

    fn next_states(self) -> &'static [Self] {
        self.allowed_next_states()
    }

    fn code(self) -> &'static str {
        self.as_str()
    }

    fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Timeout)
    }
}

/// Validate a single edge, producing the typed error on rejection.
///
/// # Errors
///
/// Returns `CoreError::InvalidTransition` when `to` is not listed in the
/// adjacency table of `from`.
pub fn check_transition<S: WorkflowStatus>(id: &str, from: S, to: S) -> Result<(), CoreError> {
    if from.permits(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity_type: S::ENTITY.as_str().to_string(),
            id: id.to_string(),
            from: from.code().to_string(),
            to: to.code().to_string(),
        })
    }
}

/// Keep an error message only when entering a failure status.
#[must_use]
pub fn error_for<S: WorkflowStatus>(target: S, message: Option<&str>) -> Option<String> {
    if target.is_failure() {
        message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
    } else {
        None
    }
}

/// An entity whose lifecycle is governed by a `WorkflowStatus`.
pub trait Stateful: Clone {
    type Status: WorkflowStatus;

    fn id(&self) -> &str;
    fn status(&self) -> Self::Status;
    fn version(&self) -> i64;

    /// Apply status-specific side effects. Only called for validated edges.
    fn apply_status(&mut self, next: Self::Status, error_message: Option<String>, now: DateTime<Utc>);

    /// Compute the entity after moving to `next`.
    ///
    /// Pure: the caller is responsible for persisting the result.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if the edge is not allowed.
    fn transitioned(
        &self,
        next: Self::Status,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        check_transition(self.id(), self.status(), next)?;
        let mut updated = self.clone();
        updated.apply_status(next, error_for(next, error_message), now);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_count<S: WorkflowStatus>() -> usize {
        S::variants()
            .iter()
            .map(|s| s.next_states().len())
            .sum()
    }

    #[test]
    fn problem_table_has_expected_edge_count() {
        // 2+3+3+3+3+3+3+2+3+4+0+1+1
        assert_eq!(edge_count::<ProblemStatus>(), 31);
    }

    #[test]
    fn check_transition_is_exhaustive_over_problem_pairs() {
        for from in ProblemStatus::ALL {
            for to in ProblemStatus::ALL {
                let result = check_transition("prb-x", from, to);
                assert_eq!(
                    result.is_ok(),
                    from.allowed_next_states().contains(&to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn failure_statuses() {
        assert!(ProblemStatus::Failed.is_failure());
        assert!(!ProblemStatus::Cancelled.is_failure());
        assert!(ExecutionStatus::Timeout.is_failure());
        assert_eq!(ExecutionStatus::Timeout.event_kind(), EventKind::Failed);
        assert_eq!(TaskStatus::Testing.event_kind(), EventKind::Transitioned);
    }

    #[test]
    fn error_only_kept_for_failure_targets() {
        assert_eq!(
            error_for(ProblemStatus::Failed, Some(" boom ")),
            Some("boom".to_string())
        );
        assert_eq!(error_for(ProblemStatus::Failed, Some("  ")), None);
        assert_eq!(error_for(ProblemStatus::Draft, Some("boom")), None);
    }

    #[test]
    fn terminal_classification() {
        assert!(ProblemStatus::Cancelled.is_terminal());
        assert!(!ProblemStatus::Testing.is_terminal());
        assert!(TaskStatus::Skipped.is_terminal());
        assert!(ExecutionStatus::Cancelled.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
    }
}
