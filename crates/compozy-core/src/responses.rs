//! Aggregate response types returned by the store and printed by `cpz`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Document, Problem};
use crate::enums::TaskStatus;

/// Number of tasks in each status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TaskCounts {
    pub pending: u32,
    pub selected: u32,
    pub in_progress: u32,
    pub testing: u32,
    pub completed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl TaskCounts {
    pub fn record(&mut self, status: TaskStatus, count: u32) {
        let slot = match status {
            TaskStatus::Pending => &mut self.pending,
            TaskStatus::Selected => &mut self.selected,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Testing => &mut self.testing,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Failed => &mut self.failed,
            TaskStatus::Skipped => &mut self.skipped,
        };
        *slot += count;
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.pending
            + self.selected
            + self.in_progress
            + self.testing
            + self.completed
            + self.failed
            + self.skipped
    }

    /// Completed tasks over all tasks, 0.0 for a problem without tasks.
    #[must_use]
    pub fn completion_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            f64::from(self.completed) / f64::from(total)
        }
    }
}

/// Read-only summary of a problem and its children.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProblemOverview {
    pub problem: Problem,
    pub progress: u8,
    pub is_active: bool,
    pub is_awaiting_review: bool,
    pub is_in_progress: bool,
    pub tasks: TaskCounts,
    pub completion_ratio: f64,
    pub unread_messages: u32,
    /// Newest version of each document kind.
    pub latest_documents: Vec<Document>,
}

/// One rejected item of a batch operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BatchFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of a batch operation. Items are attempted independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn ok(&mut self, id: impl Into<String>) {
        self.succeeded.push(id.into());
    }

    pub fn fail(&mut self, id: impl Into<String>, error: impl ToString) {
        self.failed.push(BatchFailure {
            id: id.into(),
            error: error.to_string(),
        });
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_ratio() {
        let mut counts = TaskCounts::default();
        assert!(counts.completion_ratio().abs() < f64::EPSILON);
        counts.record(TaskStatus::Completed, 3);
        counts.record(TaskStatus::Pending, 1);
        assert_eq!(counts.total(), 4);
        assert!((counts.completion_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn batch_report_collects_both_sides() {
        let mut report = BatchReport::default();
        report.ok("prb-1");
        report.fail("prb-2", "Entity not found: problem prb-2");
        assert!(!report.is_clean());
        assert_eq!(report.succeeded, vec!["prb-1"]);
        assert_eq!(report.failed[0].id, "prb-2");
    }
}
