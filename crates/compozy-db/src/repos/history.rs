//! Read access to the `status_transitions` audit trail.

use compozy_core::entities::TransitionRecord;
use compozy_core::enums::EntityType;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::WorkflowService;

const HISTORY_COLS: &str =
    "id, entity_type, entity_id, from_status, to_status, actor, reason, created_at";

fn row_to_record(row: &libsql::Row) -> Result<TransitionRecord, DatabaseError> {
    Ok(TransitionRecord {
        id: row.get(0)?,
        entity_type: parse_enum(&row.get::<String>(1)?)?,
        entity_id: row.get(2)?,
        from_status: get_opt_string(row, 3)?,
        to_status: row.get(4)?,
        actor: get_opt_string(row, 5)?,
        reason: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl WorkflowService {
    /// Every recorded status change of an entity, oldest first.
    ///
    /// The first row is the creation record (`from_status` is `None`).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn transition_history(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Vec<TransitionRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {HISTORY_COLS} FROM status_transitions
                     WHERE entity_type = ?1 AND entity_id = ?2
                     ORDER BY created_at, rowid"
                ),
                libsql::params![entity_type.as_str(), entity_id],
            )
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Most recent transitions across all entities, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn recent_transitions(
        &self,
        limit: u32,
    ) -> Result<Vec<TransitionRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {HISTORY_COLS} FROM status_transitions
                     ORDER BY created_at DESC, rowid DESC LIMIT ?1"
                ),
                [i64::from(limit)],
            )
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_org, seed_problem, test_service};
    use crate::transition::TransitionRequest;
    use compozy_core::enums::ProblemStatus;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn history_records_actor_and_reason() {
        let (svc, _) = test_service().await;
        let org = seed_org(&svc).await;
        let problem = seed_problem(&svc, &org.id).await;
        svc.transition_problem(
            &problem,
            ProblemStatus::Analyzing,
            &TransitionRequest::new().by("admin-1").because("kickoff"),
        )
        .await
        .unwrap();

        let history = svc
            .transition_history(EntityType::Problem, &problem.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from_status, None);
        assert_eq!(history[0].to_status, "draft");
        assert_eq!(history[1].from_status.as_deref(), Some("draft"));
        assert_eq!(history[1].to_status, "analyzing");
        assert_eq!(history[1].actor.as_deref(), Some("admin-1"));
        assert_eq!(history[1].reason.as_deref(), Some("kickoff"));

        let recent = svc.recent_transitions(1).await.unwrap();
        assert_eq!(recent[0].to_status, "analyzing");
    }

    #[tokio::test]
    async fn unknown_entity_has_empty_history() {
        let (svc, _) = test_service().await;
        let history = svc
            .transition_history(EntityType::Task, "tsk-nope")
            .await
            .unwrap();
        assert!(history.is_empty());
    }
}
