//! Task execution repository: attempts, logs, results and status transitions.

use chrono::Utc;

use compozy_core::entities::{Task, TaskExecution};
use compozy_core::enums::{AgentType, EntityType, ExecutionStatus};
use compozy_core::errors::CoreError;
use compozy_core::events::WorkflowEvent;
use compozy_core::ids::{PREFIX_EXECUTION, PREFIX_TRANSITION};
use compozy_core::workflow::WorkflowStatus;

use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, opt_datetime_value, opt_text_value, parse_datetime, parse_enum,
    parse_optional_datetime, parse_optional_json,
};
use crate::service::WorkflowService;
use crate::transition::{StatusRow, TransitionRequest, insert_history};

impl StatusRow for TaskExecution {
    const TABLE: &'static str = "task_executions";
    const SELECT_COLS: &'static str = "id, task_id, attempt_number, status, agent_type, job_id, \
         logs, output, metrics, error_message, started_at, completed_at, version, created_at, updated_at";

    fn from_row(row: &libsql::Row) -> Result<Self, DatabaseError> {
        Ok(Self {
            id: row.get(0)?,
            task_id: row.get(1)?,
            attempt_number: row.get(2)?,
            status: parse_enum(&row.get::<String>(3)?)?,
            agent_type: parse_enum(&row.get::<String>(4)?)?,
            job_id: get_opt_string(row, 5)?,
            logs: row.get(6)?,
            output: parse_optional_json(get_opt_string(row, 7)?.as_deref())?,
            metrics: parse_optional_json(get_opt_string(row, 8)?.as_deref())?,
            error_message: get_opt_string(row, 9)?,
            started_at: parse_optional_datetime(get_opt_string(row, 10)?.as_deref())?,
            completed_at: parse_optional_datetime(get_opt_string(row, 11)?.as_deref())?,
            version: row.get(12)?,
            created_at: parse_datetime(&row.get::<String>(13)?)?,
            updated_at: parse_datetime(&row.get::<String>(14)?)?,
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

fn json_value(value: Option<&serde_json::Value>) -> Result<libsql::Value, DatabaseError> {
    Ok(match value {
        Some(v) => libsql::Value::Text(
            serde_json::to_string(v).map_err(|e| DatabaseError::Query(e.to_string()))?,
        ),
        None => libsql::Value::Null,
    })
}

impl WorkflowService {
    /// Queue a new attempt for a task. Attempts are numbered 1, 2, 3, … per task.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the task does not exist.
    pub async fn create_execution(
        &self,
        task_id: &str,
        agent_type: AgentType,
        job_id: Option<&str>,
    ) -> Result<TaskExecution, DatabaseError> {
        self.require_task(task_id).await?;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_EXECUTION).await?;
        let history_id = self.db().generate_id(PREFIX_TRANSITION).await?;

        let execution = {
            let _guard = self.db().write_guard().await;
            let tx = self.db().conn().transaction().await?;
            let mut rows = tx
                .query(
                    "SELECT COALESCE(MAX(attempt_number), 0) + 1 FROM task_executions WHERE task_id = ?1",
                    [task_id],
                )
                .await?;
            let attempt_number = rows
                .next()
                .await?
                .ok_or(DatabaseError::NoResult)?
                .get::<i64>(0)?;
            drop(rows);

            tx.execute(
                "INSERT INTO task_executions (id, task_id, attempt_number, status, agent_type, job_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'pending', ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    task_id,
                    attempt_number,
                    agent_type.as_str(),
                    opt_text_value(job_id),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
            insert_history(
                &tx,
                &history_id,
                EntityType::Execution,
                &id,
                None,
                ExecutionStatus::Pending.code(),
                &TransitionRequest::default(),
                now,
            )
            .await?;
            tx.commit().await?;

            TaskExecution {
                id,
                task_id: task_id.to_string(),
                attempt_number,
                status: ExecutionStatus::Pending,
                agent_type,
                job_id: job_id.map(String::from),
                logs: String::new(),
                output: None,
                metrics: None,
                error_message: None,
                started_at: None,
                completed_at: None,
                version: 1,
                created_at: now,
                updated_at: now,
            }
        };

        tracing::debug!(
            execution_id = %execution.id,
            task_id,
            attempt = execution.attempt_number,
            "execution queued"
        );
        self.notifier().emit(&WorkflowEvent::created(
            &execution.id,
            execution.status,
            None,
            now,
        ));
        Ok(execution)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the execution does not exist.
    pub async fn get_execution(&self, id: &str) -> Result<TaskExecution, DatabaseError> {
        self.load_status_row(id).await
    }

    /// Attempts of a task by attempt number.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_executions(&self, task_id: &str) -> Result<Vec<TaskExecution>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {} FROM task_executions WHERE task_id = ?1 ORDER BY attempt_number",
                    TaskExecution::SELECT_COLS
                ),
                [task_id],
            )
            .await?;
        let mut executions = Vec::new();
        while let Some(row) = rows.next().await? {
            executions.push(TaskExecution::from_row(&row)?);
        }
        Ok(executions)
    }

    /// Look up the execution an external job reports for.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no execution carries `job_id`.
    pub async fn find_execution_by_job(&self, job_id: &str) -> Result<TaskExecution, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {} FROM task_executions WHERE job_id = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT 1",
                    TaskExecution::SELECT_COLS
                ),
                [job_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("execution job", job_id))?;
        TaskExecution::from_row(&row)
    }

    /// Append a chunk to the execution log. Does not bump the version.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the execution does not exist.
    pub async fn append_execution_logs(
        &self,
        id: &str,
        chunk: &str,
    ) -> Result<TaskExecution, DatabaseError> {
        let changed = {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(
                    "UPDATE task_executions SET logs = logs || ?1, updated_at = ?2 WHERE id = ?3",
                    libsql::params![chunk, Utc::now().to_rfc3339(), id],
                )
                .await?
        };
        if changed == 0 {
            return Err(CoreError::not_found("execution", id).into());
        }
        self.get_execution(id).await
    }

    /// Store the output and metrics a job reported. `None` leaves a field as is.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the execution does not exist.
    pub async fn record_execution_result(
        &self,
        id: &str,
        output: Option<&serde_json::Value>,
        metrics: Option<&serde_json::Value>,
    ) -> Result<TaskExecution, DatabaseError> {
        let output = json_value(output)?;
        let metrics = json_value(metrics)?;
        let changed = {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(
                    "UPDATE task_executions
                     SET output = COALESCE(?1, output), metrics = COALESCE(?2, metrics), updated_at = ?3
                     WHERE id = ?4",
                    libsql::params![output, metrics, Utc::now().to_rfc3339(), id],
                )
                .await?
        };
        if changed == 0 {
            return Err(CoreError::not_found("execution", id).into());
        }
        self.get_execution(id).await
    }

    /// Move an execution to `target`. Background jobs report through here.
    ///
    /// # Errors
    ///
    /// See [`Self::transition_problem`].
    pub async fn transition_execution(
        &self,
        execution: &TaskExecution,
        target: ExecutionStatus,
        request: &TransitionRequest,
    ) -> Result<TaskExecution, DatabaseError> {
        self.apply_transition(execution, target, request).await
    }

    /// Fail with `Validation` when the task does not exist.
    pub(crate) async fn require_task(&self, task_id: &str) -> Result<Task, DatabaseError> {
        self.load_status_row(task_id).await.map_err(|e| {
            if e.is_not_found() {
                CoreError::validation(format!("task {task_id} does not exist")).into()
            } else {
                e
            }
        })
    }
}
