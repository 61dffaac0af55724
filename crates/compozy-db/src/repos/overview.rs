//! Aggregate read views over a problem and its tasks.

use compozy_core::entities::Task;
use compozy_core::enums::TaskStatus;
use compozy_core::graph;
use compozy_core::progress;
use compozy_core::responses::{ProblemOverview, TaskCounts};

use crate::error::DatabaseError;
use crate::helpers::parse_enum;
use crate::service::WorkflowService;

impl WorkflowService {
    /// Problem, progress, task counts, unread messages and latest documents.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the problem does not exist.
    pub async fn problem_overview(&self, problem_id: &str) -> Result<ProblemOverview, DatabaseError> {
        let problem = self.get_problem(problem_id).await?;
        let tasks = self.task_counts(problem_id).await?;
        let unread_messages = self.unread_count(problem_id).await?;
        let latest_documents = self.latest_documents(problem_id).await?;

        Ok(ProblemOverview {
            progress: progress::progress_percentage(problem.status),
            is_active: progress::is_active(problem.status),
            is_awaiting_review: progress::is_awaiting_review(problem.status),
            is_in_progress: progress::is_in_progress(problem.status),
            completion_ratio: tasks.completion_ratio(),
            tasks,
            unread_messages,
            latest_documents,
            problem,
        })
    }

    /// Task ids of a problem, dependencies first, ties broken by `order_index`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` for an unknown problem.
    pub async fn execution_order(&self, problem_id: &str) -> Result<Vec<String>, DatabaseError> {
        self.get_problem(problem_id).await?;
        let tasks = self.list_tasks(problem_id).await?;
        Ok(graph::execution_order(&tasks)?)
    }

    /// Pending or selected tasks whose dependencies are all completed or
    /// skipped, most urgent first.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` for an unknown problem.
    pub async fn ready_tasks(&self, problem_id: &str) -> Result<Vec<Task>, DatabaseError> {
        self.get_problem(problem_id).await?;
        let tasks = self.list_tasks(problem_id).await?;
        Ok(graph::ready_tasks(&tasks).into_iter().cloned().collect())
    }

    async fn task_counts(&self, problem_id: &str) -> Result<TaskCounts, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT status, COUNT(*) FROM tasks WHERE problem_id = ?1 GROUP BY status",
                [problem_id],
            )
            .await?;
        let mut counts = TaskCounts::default();
        while let Some(row) = rows.next().await? {
            let status: TaskStatus = parse_enum(&row.get::<String>(0)?)?;
            let count = u32::try_from(row.get::<i64>(1)?)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            counts.record(status, count);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::chat::NewMessage;
    use crate::test_support::{seed_org, seed_problem, seed_task, test_service};
    use crate::transition::TransitionRequest;
    use compozy_core::entities::Sender;
    use compozy_core::enums::{AgentName, ProblemStatus};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn overview_summarises_children() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let problem = seed_problem(&svc, &org.id).await;
        let req = TransitionRequest::new();
        let problem = svc.start_analysis(&problem, &req).await.unwrap();

        let mut done = seed_task(&svc, &problem.id, "index").await;
        for status in [TaskStatus::Selected, TaskStatus::InProgress, TaskStatus::Completed] {
            done = svc.transition_task(&done, status, &req).await.unwrap();
        }
        seed_task(&svc, &problem.id, "cache").await;
        svc.post_message(NewMessage::new(
            &problem.id,
            Sender::Agent {
                agent: AgentName::BusinessAnalyst,
            },
            "Analysis started",
        ))
        .await
        .unwrap();

        let overview = svc.problem_overview(&problem.id).await.unwrap();
        assert_eq!(overview.problem.status, ProblemStatus::Analyzing);
        assert_eq!(overview.progress, 10);
        assert!(overview.is_active && overview.is_in_progress);
        assert!(!overview.is_awaiting_review);
        assert_eq!(overview.tasks.completed, 1);
        assert_eq!(overview.tasks.pending, 1);
        assert!((overview.completion_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(overview.unread_messages, 1);
        assert!(overview.latest_documents.is_empty());
    }

    #[tokio::test]
    async fn ready_tasks_follow_dependencies() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let problem = seed_problem(&svc, &org.id).await;
        let schema = seed_task(&svc, &problem.id, "schema").await;
        let api = seed_task(&svc, &problem.id, "api").await;
        let ui = seed_task(&svc, &problem.id, "ui").await;
        svc.add_dependency(&api.id, &schema.id).await.unwrap();
        svc.add_dependency(&ui.id, &api.id).await.unwrap();
        svc.update_task(&schema.id, crate::updates::TaskUpdateBuilder::new().order_index(9).build())
            .await
            .unwrap();

        let order = svc.execution_order(&problem.id).await.unwrap();
        assert_eq!(order, vec![schema.id.clone(), api.id.clone(), ui.id.clone()]);

        let ready: Vec<String> = svc
            .ready_tasks(&problem.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ready, vec![schema.id.clone()]);

        let req = TransitionRequest::new();
        svc.transition_task(&schema, TaskStatus::Skipped, &req).await.unwrap();
        let ready: Vec<String> = svc
            .ready_tasks(&problem.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ready, vec![api.id]);
    }

    #[tokio::test]
    async fn overview_of_missing_problem_is_not_found() {
        let (svc, _) = test_service().await;
        assert!(svc.problem_overview("prb-none").await.unwrap_err().is_not_found());
    }
}
