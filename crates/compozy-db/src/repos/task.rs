//! Task repository: CRUD, dependency edges and status transitions.

use std::collections::HashMap;

use chrono::Utc;

use compozy_core::entities::Task;
use compozy_core::enums::{EntityType, Priority, TaskStatus};
use compozy_core::errors::CoreError;
use compozy_core::events::WorkflowEvent;
use compozy_core::graph::would_create_cycle;
use compozy_core::ids::{PREFIX_TASK, PREFIX_TRANSITION};
use compozy_core::workflow::WorkflowStatus;

use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, opt_datetime_value, opt_text_value, parse_datetime, parse_enum,
    parse_optional_datetime,
};
use crate::service::WorkflowService;
use crate::transition::{StatusRow, TransitionRequest, insert_history};
use crate::updates::TaskUpdate;

/// Input for [`WorkflowService::create_task`].
#[derive(Debug, Clone)]
pub struct NewTask {
    pub problem_id: String,
    pub title: String,
    pub description: String,
    pub spec: String,
    pub priority: Priority,
    /// Appended after the last task when `None`.
    pub order_index: Option<i64>,
    /// Tasks of the same problem this one depends on.
    pub dependencies: Vec<String>,
}

impl NewTask {
    #[must_use]
    pub fn new(problem_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            problem_id: problem_id.into(),
            title: title.into(),
            description: String::new(),
            spec: String::new(),
            priority: Priority::default(),
            order_index: None,
            dependencies: Vec::new(),
        }
    }
}

impl StatusRow for Task {
    const TABLE: &'static str = "tasks";
    const SELECT_COLS: &'static str = "id, problem_id, title, description, spec, status, priority, \
         order_index, started_at, completed_at, error_message, version, created_at, updated_at";

    fn from_row(row: &libsql::Row) -> Result<Self, DatabaseError> {
        Ok(Self {
            id: row.get(0)?,
            problem_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            spec: row.get(4)?,
            status: parse_enum(&row.get::<String>(5)?)?,
            priority: parse_enum(&row.get::<String>(6)?)?,
            order_index: row.get(7)?,
            dependencies: Vec::new(),
            started_at: parse_optional_datetime(get_opt_string(row, 8)?.as_deref())?,
            completed_at: parse_optional_datetime(get_opt_string(row, 9)?.as_deref())?,
            error_message: get_opt_string(row, 10)?,
            version: row.get(11)?,
            created_at: parse_datetime(&row.get::<String>(12)?)?,
            updated_at: parse_datetime(&row.get::<String>(13)?)?,
        })
    }

    fn status_columns(&self) -> Vec<(&'static str, libsql::Value)> {
        vec![
            ("status", libsql::Value::Text(self.status.as_str().to_string())),
            ("error_message", opt_text_value(self.error_message.as_deref())),
            ("started_at", opt_datetime_value(self.started_at)),
            ("completed_at", opt_datetime_value(self.completed_at)),
        ]
    }
}

impl WorkflowService {
    /// Create a task in `pending`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank title, an unknown problem,
    /// or a dependency that is missing or belongs to another problem.
    pub async fn create_task(&self, new: NewTask) -> Result<Task, DatabaseError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(CoreError::validation("task title must not be blank").into());
        }

        let mut dependencies = new.dependencies.clone();
        dependencies.sort();
        dependencies.dedup();

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_TASK).await?;
        let history_id = self.db().generate_id(PREFIX_TRANSITION).await?;

        let task = {
            let _guard = self.db().write_guard().await;
            // Deletes take the gate too, so these checks hold until the insert.
            self.require_problem(&new.problem_id).await?;
            for dep in &dependencies {
                let dep_task: Task = self.load_status_row(dep).await.map_err(|e| {
                    if e.is_not_found() {
                        CoreError::validation(format!("dependency {dep} does not exist")).into()
                    } else {
                        e
                    }
                })?;
                if dep_task.problem_id != new.problem_id {
                    return Err(CoreError::validation(format!(
                        "dependency {dep} belongs to another problem"
                    ))
                    .into());
                }
            }
            let order_index = match new.order_index {
                Some(index) => index,
                None => self.next_order_index(&new.problem_id).await?,
            };
            let task = Task {
                id,
                problem_id: new.problem_id,
                title: title.to_string(),
                description: new.description,
                spec: new.spec,
                status: TaskStatus::Pending,
                priority: new.priority,
                order_index,
                dependencies,
                started_at: None,
                completed_at: None,
                error_message: None,
                version: 1,
                created_at: now,
                updated_at: now,
            };

            let tx = self.db().conn().transaction().await?;
            tx.execute(
                &format!(
                    "INSERT INTO tasks ({})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, NULL, NULL, 1, ?9, ?10)",
                    Task::SELECT_COLS
                ),
                libsql::params![
                    task.id.as_str(),
                    task.problem_id.as_str(),
                    task.title.as_str(),
                    task.description.as_str(),
                    task.spec.as_str(),
                    task.status.as_str(),
                    task.priority.as_str(),
                    task.order_index,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
            for dep in &task.dependencies {
                tx.execute(
                    "INSERT INTO task_dependencies (task_id, depends_on_id, created_at) VALUES (?1, ?2, ?3)",
                    libsql::params![task.id.as_str(), dep.as_str(), now.to_rfc3339()],
                )
                .await?;
            }
            insert_history(
                &tx,
                &history_id,
                EntityType::Task,
                &task.id,
                None,
                task.status.code(),
                &TransitionRequest::default(),
                now,
            )
            .await?;
            tx.commit().await?;
            task
        };

        self.notifier()
            .emit(&WorkflowEvent::created(&task.id, task.status, None, now));
        Ok(task)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the task does not exist.
    pub async fn get_task(&self, id: &str) -> Result<Task, DatabaseError> {
        let mut task: Task = self.load_status_row(id).await?;
        task.dependencies = self.task_dependencies(id).await?;
        Ok(task)
    }

    /// Tasks of a problem ordered by `order_index`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_tasks(&self, problem_id: &str) -> Result<Vec<Task>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {} FROM tasks WHERE problem_id = ?1 ORDER BY order_index, created_at, rowid",
                    Task::SELECT_COLS
                ),
                [problem_id],
            )
            .await?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await? {
            tasks.push(Task::from_row(&row)?);
        }
        let mut edges = self.dependency_map(problem_id).await?;
        for task in &mut tasks {
            task.dependencies = edges.remove(&task.id).unwrap_or_default();
        }
        Ok(tasks)
    }

    /// Update descriptive fields. Status is not touched.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank title and
    /// `CoreError::NotFound` if the task does not exist.
    pub async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task, DatabaseError> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(CoreError::validation("task title must not be blank").into());
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
        if let Some(ref spec) = update.spec {
            params.push(spec.clone().into());
            sets.push(format!("spec = ?{}", params.len()));
        }
        if let Some(priority) = update.priority {
            params.push(priority.as_str().into());
            sets.push(format!("priority = ?{}", params.len()));
        }
        if let Some(order_index) = update.order_index {
            params.push(libsql::Value::Integer(order_index));
            sets.push(format!("order_index = ?{}", params.len()));
        }
        if sets.is_empty() {
            return self.get_task(id).await;
        }
        params.push(Utc::now().to_rfc3339().into());
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(id.into());
        let sql = format!(
            "UPDATE tasks SET {} WHERE id = ?{}",
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
            return Err(CoreError::not_found("task", id).into());
        }
        self.get_task(id).await
    }

    /// Delete a task with its executions, dependency edges and history.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the task does not exist.
    pub async fn delete_task(&self, id: &str) -> Result<(), DatabaseError> {
        let _guard = self.db().write_guard().await;
        let tx = self.db().conn().transaction().await?;
        tx.execute(
            "DELETE FROM status_transitions WHERE
                (entity_type = 'task' AND entity_id = ?1)
             OR (entity_type = 'execution' AND entity_id IN
                    (SELECT id FROM task_executions WHERE task_id = ?1))",
            [id],
        )
        .await?;
        let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", [id]).await?;
        if deleted == 0 {
            tx.rollback().await?;
            return Err(CoreError::not_found("task", id).into());
        }
        tx.commit().await?;
        Ok(())
    }

    /// Record that `task_id` depends on `depends_on_id`.
    ///
    /// The graph is left unchanged on any error.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CyclicDependency` if the edge would close a cycle
    /// (including a self edge), `CoreError::Validation` if the tasks belong
    /// to different problems, and `CoreError::NotFound` for a missing task.
    pub async fn add_dependency(
        &self,
        task_id: &str,
        depends_on_id: &str,
    ) -> Result<Task, DatabaseError> {
        if task_id == depends_on_id {
            return Err(CoreError::CyclicDependency {
                task_id: task_id.to_string(),
                depends_on: depends_on_id.to_string(),
            }
            .into());
        }
        let task: Task = self.load_status_row(task_id).await?;
        let target: Task = self.load_status_row(depends_on_id).await?;
        if task.problem_id != target.problem_id {
            return Err(CoreError::validation(format!(
                "{task_id} and {depends_on_id} belong to different problems"
            ))
            .into());
        }

        {
            let _guard = self.db().write_guard().await;
            let edges = self.dependency_map(&task.problem_id).await?;
            if would_create_cycle(&edges, task_id, depends_on_id) {
                return Err(CoreError::CyclicDependency {
                    task_id: task_id.to_string(),
                    depends_on: depends_on_id.to_string(),
                }
                .into());
            }
            self.db()
                .conn()
                .execute(
                    "INSERT OR IGNORE INTO task_dependencies (task_id, depends_on_id, created_at)
                     VALUES (?1, ?2, ?3)",
                    libsql::params![task_id, depends_on_id, Utc::now().to_rfc3339()],
                )
                .await?;
        }
        tracing::debug!(task_id, depends_on_id, "dependency added");
        self.get_task(task_id).await
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the task does not exist.
    pub async fn remove_dependency(
        &self,
        task_id: &str,
        depends_on_id: &str,
    ) -> Result<Task, DatabaseError> {
        {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(
                    "DELETE FROM task_dependencies WHERE task_id = ?1 AND depends_on_id = ?2",
                    libsql::params![task_id, depends_on_id],
                )
                .await?;
        }
        self.get_task(task_id).await
    }

    /// Move a task to `target`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition`, `CoreError::ConcurrentModification`
    /// or `CoreError::NotFound`; see [`Self::transition_problem`].
    pub async fn transition_task(
        &self,
        task: &Task,
        target: TaskStatus,
        request: &TransitionRequest,
    ) -> Result<Task, DatabaseError> {
        let mut updated = self.apply_transition(task, target, request).await?;
        updated.dependencies = self.task_dependencies(&updated.id).await?;
        Ok(updated)
    }

    /// Return a selected, completed, failed or skipped task to `pending`,
    /// clearing its run timestamps and error.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_task`].
    pub async fn reset_task(
        &self,
        task: &Task,
        request: &TransitionRequest,
    ) -> Result<Task, DatabaseError> {
        self.transition_task(task, TaskStatus::Pending, request)
            .await
    }

    async fn next_order_index(&self, problem_id: &str) -> Result<i64, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COALESCE(MAX(order_index) + 1, 0) FROM tasks WHERE problem_id = ?1",
                [problem_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }

    async fn task_dependencies(&self, task_id: &str) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT depends_on_id FROM task_dependencies WHERE task_id = ?1 ORDER BY depends_on_id",
                [task_id],
            )
            .await?;
        let mut deps = Vec::new();
        while let Some(row) = rows.next().await? {
            deps.push(row.get::<String>(0)?);
        }
        Ok(deps)
    }

    /// Dependency edges of every task in a problem.
    pub(crate) async fn dependency_map(
        &self,
        problem_id: &str,
    ) -> Result<HashMap<String, Vec<String>>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT d.task_id, d.depends_on_id FROM task_dependencies d
                 JOIN tasks t ON d.task_id = t.id
                 WHERE t.problem_id = ?1
                 ORDER BY d.task_id, d.depends_on_id",
                [problem_id],
            )
            .await?;
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        while let Some(row) = rows.next().await? {
            edges
                .entry(row.get::<String>(0)?)
                .or_default()
                .push(row.get::<String>(1)?);
        }
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_org, seed_problem, seed_task, test_service};
    use crate::updates::TaskUpdateBuilder;

    #[tokio::test]
    async fn order_index_appends() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let problem = seed_problem(&svc, &org.id).await;
        let a = seed_task(&svc, &problem.id, "a").await;
        let b = seed_task(&svc, &problem.id, "b").await;
        assert_eq!((a.order_index, b.order_index), (0, 1));

        let tasks = svc.list_tasks(&problem.id).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, a.id);
    }

    #[tokio::test]
    async fn task_needs_existing_problem() {
        let (svc, _) = test_service().await;
        let err = svc
            .create_task(NewTask::new("prb-missing", "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn dependencies_on_create_must_share_problem() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let p1 = seed_problem(&svc, &org.id).await;
        let p2 = seed_problem(&svc, &org.id).await;
        let foreign = seed_task(&svc, &p2.id, "foreign").await;
        let local = seed_task(&svc, &p1.id, "local").await;

        let mut new = NewTask::new(&p1.id, "uses both");
        new.dependencies = vec![local.id.clone(), foreign.id.clone()];
        let err = svc.create_task(new).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::Validation(_))));

        let mut ok = NewTask::new(&p1.id, "uses local");
        ok.dependencies = vec![local.id.clone()];
        let created = svc.create_task(ok).await.unwrap();
        assert_eq!(svc.get_task(&created.id).await.unwrap().dependencies, vec![local.id]);
    }

    #[tokio::test]
    async fn cycle_rejected_and_graph_unchanged() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let problem = seed_problem(&svc, &org.id).await;
        let a = seed_task(&svc, &problem.id, "a").await;
        let b = seed_task(&svc, &problem.id, "b").await;
        let c = seed_task(&svc, &problem.id, "c").await;

        svc.add_dependency(&b.id, &a.id).await.unwrap();
        svc.add_dependency(&c.id, &b.id).await.unwrap();
        let before = svc.dependency_map(&problem.id).await.unwrap();

        let err = svc.add_dependency(&a.id, &c.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::CyclicDependency { .. })));
        let self_edge = svc.add_dependency(&a.id, &a.id).await.unwrap_err();
        assert!(matches!(self_edge, DatabaseError::Core(CoreError::CyclicDependency { .. })));

        assert_eq!(svc.dependency_map(&problem.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn cross_problem_edge_is_validation_error() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let p1 = seed_problem(&svc, &org.id).await;
        let p2 = seed_problem(&svc, &org.id).await;
        let a = seed_task(&svc, &p1.id, "a").await;
        let b = seed_task(&svc, &p2.id, "b").await;
        let err = svc.add_dependency(&a.id, &b.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn remove_dependency_and_update() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let problem = seed_problem(&svc, &org.id).await;
        let a = seed_task(&svc, &problem.id, "a").await;
        let b = seed_task(&svc, &problem.id, "b").await;
        svc.add_dependency(&b.id, &a.id).await.unwrap();
        let b = svc.remove_dependency(&b.id, &a.id).await.unwrap();
        assert!(b.dependencies.is_empty());

        let b = svc
            .update_task(
                &b.id,
                TaskUpdateBuilder::new()
                    .spec("Use a covering index")
                    .order_index(10)
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(b.spec, "Use a covering index");
        assert_eq!(b.order_index, 10);
        assert_eq!(b.version, 1);
    }

    #[tokio::test]
    async fn reset_after_failure_clears_run_state() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let problem = seed_problem(&svc, &org.id).await;
        let task = seed_task(&svc, &problem.id, "flaky").await;
        let req = TransitionRequest::new().by("worker-1");

        let task = svc.transition_task(&task, TaskStatus::Selected, &req).await.unwrap();
        let task = svc.transition_task(&task, TaskStatus::InProgress, &req).await.unwrap();
        assert!(task.started_at.is_some());
        let failed = svc
            .transition_task(&task, TaskStatus::Failed, &req.clone().with_error("linker error"))
            .await
            .unwrap();
        let stored = svc.get_task(&failed.id).await.unwrap();
        assert_eq!(stored.error_message.as_deref(), Some("linker error"));
        assert!(stored.completed_at.is_some());

        let reset = svc.reset_task(&stored, &req).await.unwrap();
        let stored = svc.get_task(&reset.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
        assert_eq!(stored.started_at, None);
        assert_eq!(stored.completed_at, None);
        assert_eq!(stored.error_message, None);
        assert_eq!(stored.version, 5);
    }

    #[tokio::test]
    async fn running_task_cannot_be_reset() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let problem = seed_problem(&svc, &org.id).await;
        let req = TransitionRequest::new();
        let mut task = seed_task(&svc, &problem.id, "busy").await;
        for status in [TaskStatus::Selected, TaskStatus::InProgress] {
            task = svc.transition_task(&task, status, &req).await.unwrap();
        }
        let err = svc.reset_task(&task, &req).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::InvalidTransition { .. })));
    }
}
