//! The single status-write path.
//!
//! Every Problem, Task and `TaskExecution` status change goes through
//! [`WorkflowService::apply_transition`]:
//!
//! 1. validate the edge against the caller's snapshot
//! 2. take the write gate and open a transaction
//! 3. compare-and-swap on `(id, version)`
//! 4. append a `status_transitions` row
//! 5. re-read the row, so non-status edits made since the snapshot show up
//! 6. commit, then emit one event
//!
//! When the compare-and-swap misses, the stored row decides the outcome:
//! already at the target is a silent no-op, an unreachable target is
//! `InvalidTransition`, anything else is `ConcurrentModification`.

use chrono::{DateTime, Utc};

use compozy_core::enums::EntityType;
use compozy_core::errors::CoreError;
use compozy_core::events::WorkflowEvent;
use compozy_core::ids::PREFIX_TRANSITION;
use compozy_core::workflow::{Stateful, WorkflowStatus};

use crate::error::DatabaseError;
use crate::helpers::opt_text_value;
use crate::service::WorkflowService;

/// Who asked for a transition and why.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionRequest {
    pub actor: Option<String>,
    pub reason: Option<String>,
    /// Stored only when the target is a failure status.
    pub error_message: Option<String>,
}

impl TransitionRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn by(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    #[must_use]
    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// A stored entity whose status column is managed by `apply_transition`.
pub(crate) trait StatusRow: Stateful {
    const TABLE: &'static str;
    const SELECT_COLS: &'static str;

    fn from_row(row: &libsql::Row) -> Result<Self, DatabaseError>;

    /// Columns a transition writes, other than `version` and `updated_at`.
    fn status_columns(&self) -> Vec<(&'static str, libsql::Value)>;
}

/// Insert one history row. Runs inside the caller's transaction.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_history(
    conn: &libsql::Connection,
    id: &str,
    entity_type: EntityType,
    entity_id: &str,
    from_status: Option<&str>,
    to_status: &str,
    request: &TransitionRequest,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO status_transitions (id, entity_type, entity_id, from_status, to_status, actor, reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        libsql::params![
            id,
            entity_type.as_str(),
            entity_id,
            opt_text_value(from_status),
            to_status,
            opt_text_value(request.actor.as_deref()),
            opt_text_value(request.reason.as_deref()),
            at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

async fn select_status_row<E: StatusRow>(
    conn: &libsql::Connection,
    id: &str,
) -> Result<E, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM {} WHERE id = ?1", E::SELECT_COLS, E::TABLE),
            [id],
        )
        .await?;
    let row = rows
        .next()
        .await?
        .ok_or_else(|| CoreError::not_found(<E::Status as WorkflowStatus>::ENTITY.as_str(), id))?;
    E::from_row(&row)
}

impl WorkflowService {
    pub(crate) async fn load_status_row<E: StatusRow>(&self, id: &str) -> Result<E, DatabaseError> {
        select_status_row(self.db().conn(), id).await
    }

    /// Move `snapshot` to `target`. See the module docs for the protocol.
    pub(crate) async fn apply_transition<E: StatusRow>(
        &self,
        snapshot: &E,
        target: E::Status,
        request: &TransitionRequest,
    ) -> Result<E, DatabaseError> {
        let now = Utc::now();
        let updated = snapshot.transitioned(target, request.error_message.as_deref(), now)?;
        let entity = <E::Status as WorkflowStatus>::ENTITY;
        let history_id = self.db().generate_id(PREFIX_TRANSITION).await?;

        let mut params: Vec<libsql::Value> = Vec::new();
        let mut sets = Vec::new();
        for (column, value) in updated.status_columns() {
            params.push(value);
            sets.push(format!("{column} = ?{}", params.len()));
        }
        params.push(libsql::Value::Integer(updated.version()));
        sets.push(format!("version = ?{}", params.len()));
        params.push(libsql::Value::Text(now.to_rfc3339()));
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(libsql::Value::Text(snapshot.id().to_string()));
        let id_idx = params.len();
        params.push(libsql::Value::Integer(snapshot.version()));
        let version_idx = params.len();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{id_idx} AND version = ?{version_idx}",
            E::TABLE,
            sets.join(", ")
        );

        let guard = self.db().write_guard().await;
        let tx = self.db().conn().transaction().await?;
        let changed = tx.execute(&sql, libsql::params_from_iter(params)).await?;

        if changed == 0 {
            tx.rollback().await?;
            drop(guard);
            return self.resolve_missed_write(snapshot, target).await;
        }

        insert_history(
            &tx,
            &history_id,
            entity,
            snapshot.id(),
            Some(snapshot.status().code()),
            target.code(),
            request,
            now,
        )
        .await?;
        let stored: E = select_status_row(&tx, snapshot.id()).await?;
        tx.commit().await?;
        drop(guard);

        tracing::info!(
            entity_type = %entity,
            entity_id = snapshot.id(),
            version = stored.version(),
            "{} -> {}",
            snapshot.status(),
            target
        );
        self.notifier().emit(&WorkflowEvent::transition(
            snapshot.id(),
            snapshot.status(),
            target,
            request.actor.as_deref(),
            request.reason.as_deref(),
            now,
        ));
        Ok(stored)
    }

    async fn resolve_missed_write<E: StatusRow>(
        &self,
        snapshot: &E,
        target: E::Status,
    ) -> Result<E, DatabaseError> {
        let current: E = self.load_status_row(snapshot.id()).await?;
        if current.status() == target {
            tracing::debug!(entity_id = snapshot.id(), status = %target, "already at target");
            return Ok(current);
        }
        if !current.status().permits(target) {
            return Err(CoreError::InvalidTransition {
                entity_type: <E::Status as WorkflowStatus>::ENTITY.as_str().to_string(),
                id: snapshot.id().to_string(),
                from: current.status().code().to_string(),
                to: target.code().to_string(),
            }
            .into());
        }
        Err(CoreError::ConcurrentModification {
            entity_type: <E::Status as WorkflowStatus>::ENTITY.as_str().to_string(),
            id: snapshot.id().to_string(),
            expected_version: snapshot.version(),
        }
        .into())
    }
}
