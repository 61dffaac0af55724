//! Batch variants of the status writes. Each item is attempted on its own;
//! one failure never aborts the rest.

use compozy_core::enums::{ProblemStatus, TaskStatus};
use compozy_core::responses::BatchReport;

use crate::service::WorkflowService;
use crate::transition::TransitionRequest;

impl WorkflowService {
    /// Move every listed problem to `target` from its current stored state.
    pub async fn batch_transition_problems(
        &self,
        ids: &[String],
        target: ProblemStatus,
        request: &TransitionRequest,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for id in ids {
            let outcome = match self.get_problem(id).await {
                Ok(problem) => self.transition_problem(&problem, target, request).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(_) => report.ok(id.as_str()),
                Err(e) => report.fail(id.as_str(), e),
            }
        }
        tracing::info!(
            target_status = %target,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch problem transition"
        );
        report
    }

    /// Move every listed task to `target` from its current stored state.
    pub async fn batch_transition_tasks(
        &self,
        ids: &[String],
        target: TaskStatus,
        request: &TransitionRequest,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for id in ids {
            let outcome = match self.get_task(id).await {
                Ok(task) => self.transition_task(&task, target, request).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(_) => report.ok(id.as_str()),
                Err(e) => report.fail(id.as_str(), e),
            }
        }
        tracing::info!(
            target_status = %target,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch task transition"
        );
        report
    }

    /// Set the read flag on every listed message.
    pub async fn batch_mark_messages(&self, ids: &[String], read: bool) -> BatchReport {
        let mut report = BatchReport::default();
        for id in ids {
            match self.mark_message_read(id, read).await {
                Ok(_) => report.ok(id.as_str()),
                Err(e) => report.fail(id.as_str(), e),
            }
        }
        report
    }
}
