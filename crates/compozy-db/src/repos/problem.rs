//! Problem repository: CRUD, repository links and status transitions.

use chrono::Utc;

use compozy_core::entities::Problem;
use compozy_core::enums::{EntityType, MemberRole, Priority, ProblemStatus};
use compozy_core::errors::CoreError;
use compozy_core::events::WorkflowEvent;
use compozy_core::ids::{PREFIX_PROBLEM, PREFIX_TRANSITION};
use compozy_core::workflow::WorkflowStatus;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, opt_text_value, parse_datetime, parse_enum};
use crate::service::WorkflowService;
use crate::transition::{StatusRow, TransitionRequest, insert_history};
use crate::updates::ProblemUpdate;

/// Input for [`WorkflowService::create_problem`].
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub organization_id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// When set, must be an admin or member of the organization.
    pub created_by: Option<String>,
    /// Repositories of the same organization to link.
    pub repository_ids: Vec<String>,
    pub workflow_id: Option<String>,
}

/// Filter criteria for [`WorkflowService::list_problems`].
#[derive(Debug, Default, Clone)]
pub struct ProblemFilter {
    pub organization_id: Option<String>,
    pub status: Option<ProblemStatus>,
    pub limit: Option<u32>,
}

impl StatusRow for Problem {
    const TABLE: &'static str = "problems";
    const SELECT_COLS: &'static str = "id, organization_id, created_by, title, description, status, \
         priority, workflow_id, error_message, version, created_at, updated_at";

    fn from_row(row: &libsql::Row) -> Result<Self, DatabaseError> {
        Ok(Self {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            created_by: get_opt_string(row, 2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            status: parse_enum(&row.get::<String>(5)?)?,
            priority: parse_enum(&row.get::<String>(6)?)?,
            repository_ids: Vec::new(),
            workflow_id: get_opt_string(row, 7)?,
            error_message: get_opt_string(row, 8)?,
            version: row.get(9)?,
            created_at: parse_datetime(&row.get::<String>(10)?)?,
            updated_at: parse_datetime(&row.get::<String>(11)?)?,
        })
    }

    fn status_columns(&self) -> Vec<(&'static str, libsql::Value)> {
        vec![
            ("status", libsql::Value::Text(self.status.as_str().to_string())),
            ("error_message", opt_text_value(self.error_message.as_deref())),
        ]
    }
}

impl WorkflowService {
    /// Create a problem in `draft`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank title, an unknown
    /// organization or a repository outside the organization, and
    /// `CoreError::PermissionDenied` if `created_by` may not create problems.
    pub async fn create_problem(&self, new: NewProblem) -> Result<Problem, DatabaseError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(CoreError::validation("problem title must not be blank").into());
        }
        self.require_organization(&new.organization_id).await?;
        if let Some(user) = new.created_by.as_deref() {
            self.require_role(
                &new.organization_id,
                user,
                MemberRole::can_create_problems,
                "create problems",
            )
            .await?;
        }
        for repo_id in &new.repository_ids {
            self.require_repository_in(&new.organization_id, repo_id).await?;
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_PROBLEM).await?;
        let history_id = self.db().generate_id(PREFIX_TRANSITION).await?;
        let mut repository_ids = new.repository_ids.clone();
        repository_ids.sort();
        repository_ids.dedup();

        let problem = Problem {
            id,
            organization_id: new.organization_id,
            created_by: new.created_by,
            title: title.to_string(),
            description: new.description,
            status: ProblemStatus::Draft,
            priority: new.priority,
            repository_ids,
            workflow_id: new.workflow_id,
            error_message: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        {
            let _guard = self.db().write_guard().await;
            let tx = self.db().conn().transaction().await?;
            tx.execute(
                &format!(
                    "INSERT INTO problems ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, 1, ?9, ?10)",
                    Problem::SELECT_COLS
                ),
                libsql::params![
                    problem.id.as_str(),
                    problem.organization_id.as_str(),
                    problem.created_by.as_deref(),
                    problem.title.as_str(),
                    problem.description.as_str(),
                    problem.status.as_str(),
                    problem.priority.as_str(),
                    problem.workflow_id.as_deref(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
            for repo_id in &problem.repository_ids {
                tx.execute(
                    "INSERT INTO problem_repositories (problem_id, repository_id) VALUES (?1, ?2)",
                    libsql::params![problem.id.as_str(), repo_id.as_str()],
                )
                .await?;
            }
            let request = TransitionRequest {
                actor: problem.created_by.clone(),
                ..TransitionRequest::default()
            };
            insert_history(
                &tx,
                &history_id,
                EntityType::Problem,
                &problem.id,
                None,
                problem.status.code(),
                &request,
                now,
            )
            .await?;
            tx.commit().await?;
        }

        self.notifier().emit(&WorkflowEvent::created(
            &problem.id,
            problem.status,
            problem.created_by.as_deref(),
            now,
        ));
        Ok(problem)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the problem does not exist.
    pub async fn get_problem(&self, id: &str) -> Result<Problem, DatabaseError> {
        let mut problem: Problem = self.load_status_row(id).await?;
        problem.repository_ids = self.problem_repository_ids(id).await?;
        Ok(problem)
    }

    /// Problems newest first, optionally filtered by organization and status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_problems(&self, filter: &ProblemFilter) -> Result<Vec<Problem>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref org) = filter.organization_id {
            params.push(libsql::Value::Text(org.clone()));
            conditions.push(format!("organization_id = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit_clause = filter
            .limit
            .map_or_else(String::new, |limit| format!("LIMIT {limit}"));

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {} FROM problems {where_clause} ORDER BY created_at DESC, rowid DESC {limit_clause}",
                    Problem::SELECT_COLS
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut problems = Vec::new();
        while let Some(row) = rows.next().await? {
            problems.push(Problem::from_row(&row)?);
        }
        for problem in &mut problems {
            problem.repository_ids = self.problem_repository_ids(&problem.id).await?;
        }
        Ok(problems)
    }

    /// Update descriptive fields. Status is not touched.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank title and
    /// `CoreError::NotFound` if the problem does not exist.
    pub async fn update_problem(
        &self,
        id: &str,
        update: ProblemUpdate,
    ) -> Result<Problem, DatabaseError> {
        if update.is_empty() {
            return self.get_problem(id).await;
        }
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(CoreError::validation("problem title must not be blank").into());
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(ref title) = update.title {
            params.push(title.trim().into());
            sets.push(format!("title = ?{}", params.len()));
        }
        if let Some(ref description) = update.description {
            params.push(description.clone().into());
            sets.push(format!("description = ?{}", params.len()));
        }
        if let Some(priority) = update.priority {
            params.push(priority.as_str().into());
            sets.push(format!("priority = ?{}", params.len()));
        }
        if let Some(ref workflow_id) = update.workflow_id {
            params.push(opt_text_value(workflow_id.as_deref()));
            sets.push(format!("workflow_id = ?{}", params.len()));
        }
        params.push(Utc::now().to_rfc3339().into());
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(id.into());
        let sql = format!(
            "UPDATE problems SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );

        let changed = {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?
        };
        if changed == 0 {
            return Err(CoreError::not_found("problem", id).into());
        }
        tracing::debug!(
            problem_id = id,
            update = %serde_json::to_string(&update).unwrap_or_default(),
            "problem updated"
        );
        self.get_problem(id).await
    }

    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the repository belongs to another
    /// organization, and `CoreError::NotFound` if the problem does not exist.
    pub async fn link_repository(
        &self,
        problem_id: &str,
        repository_id: &str,
    ) -> Result<Problem, DatabaseError> {
        let problem = self.get_problem(problem_id).await?;
        self.require_repository_in(&problem.organization_id, repository_id)
            .await?;
        {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(
                    "INSERT OR IGNORE INTO problem_repositories (problem_id, repository_id) VALUES (?1, ?2)",
                    libsql::params![problem_id, repository_id],
                )
                .await?;
        }
        self.get_problem(problem_id).await
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the problem does not exist.
    pub async fn unlink_repository(
        &self,
        problem_id: &str,
        repository_id: &str,
    ) -> Result<Problem, DatabaseError> {
        {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(
                    "DELETE FROM problem_repositories WHERE problem_id = ?1 AND repository_id = ?2",
                    libsql::params![problem_id, repository_id],
                )
                .await?;
        }
        self.get_problem(problem_id).await
    }

    /// Delete a problem with its tasks, executions, messages, documents and
    /// status history.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the problem does not exist.
    pub async fn delete_problem(&self, id: &str) -> Result<(), DatabaseError> {
        let _guard = self.db().write_guard().await;
        let tx = self.db().conn().transaction().await?;
        tx.execute(
            "DELETE FROM status_transitions WHERE
                (entity_type = 'problem' AND entity_id = ?1)
             OR (entity_type = 'task' AND entity_id IN
                    (SELECT id FROM tasks WHERE problem_id = ?1))
             OR (entity_type = 'execution' AND entity_id IN
                    (SELECT e.id FROM task_executions e JOIN tasks t ON e.task_id = t.id
                     WHERE t.problem_id = ?1))",
            [id],
        )
        .await?;
        let deleted = tx.execute("DELETE FROM problems WHERE id = ?1", [id]).await?;
        if deleted == 0 {
            tx.rollback().await?;
            return Err(CoreError::not_found("problem", id).into());
        }
        tx.commit().await?;
        tracing::info!(problem_id = id, "problem deleted");
        Ok(())
    }

    /// Move a problem to `target`.
    ///
    /// `problem` is the caller's snapshot; its `version` is checked against
    /// the stored row.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if the edge is not allowed,
    /// `CoreError::ConcurrentModification` if the row changed since the
    /// snapshot, and `CoreError::NotFound` if it was deleted.
    pub async fn transition_problem(
        &self,
        problem: &Problem,
        target: ProblemStatus,
        request: &TransitionRequest,
    ) -> Result<Problem, DatabaseError> {
        let mut updated = self.apply_transition(problem, target, request).await?;
        updated.repository_ids = self.problem_repository_ids(&updated.id).await?;
        Ok(updated)
    }

    /// `draft -> analyzing`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_problem`].
    pub async fn start_analysis(
        &self,
        problem: &Problem,
        request: &TransitionRequest,
    ) -> Result<Problem, DatabaseError> {
        self.transition_problem(problem, ProblemStatus::Analyzing, request)
            .await
    }

    /// Move to `failed`, storing `message`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_problem`].
    pub async fn mark_failed(
        &self,
        problem: &Problem,
        message: &str,
        request: &TransitionRequest,
    ) -> Result<Problem, DatabaseError> {
        let request = request.clone().with_error(message);
        self.transition_problem(problem, ProblemStatus::Failed, &request)
            .await
    }

    /// # Errors
    ///
    /// See [`Self::transition_problem`].
    pub async fn cancel_problem(
        &self,
        problem: &Problem,
        request: &TransitionRequest,
    ) -> Result<Problem, DatabaseError> {
        self.transition_problem(problem, ProblemStatus::Cancelled, request)
            .await
    }

    /// `failed | cancelled -> draft`. Clears the error message.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_problem`].
    pub async fn reopen_problem(
        &self,
        problem: &Problem,
        request: &TransitionRequest,
    ) -> Result<Problem, DatabaseError> {
        self.transition_problem(problem, ProblemStatus::Draft, request)
            .await
    }

    pub(crate) async fn problem_repository_ids(
        &self,
        problem_id: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT repository_id FROM problem_repositories WHERE problem_id = ?1 ORDER BY repository_id",
                [problem_id],
            )
            .await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    pub(crate) async fn require_problem(&self, problem_id: &str) -> Result<(), DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT 1 FROM problems WHERE id = ?1", [problem_id])
            .await?;
        if rows.next().await?.is_none() {
            return Err(
                CoreError::validation(format!("problem {problem_id} does not exist")).into(),
            );
        }
        Ok(())
    }

    async fn require_repository_in(
        &self,
        organization_id: &str,
        repository_id: &str,
    ) -> Result<(), DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT organization_id FROM repositories WHERE id = ?1",
                [repository_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) if row.get::<String>(0)? == organization_id => Ok(()),
            Some(_) => Err(CoreError::validation(format!(
                "repository {repository_id} belongs to another organization"
            ))
            .into()),
            None => Err(
                CoreError::validation(format!("repository {repository_id} does not exist")).into(),
            ),
        }
    }
}
