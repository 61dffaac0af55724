//! Domain error types for Compozy.
//!
//! These are the typed failures every workflow operation can surface. Storage
//! errors (`DatabaseError`) live in `compozy-db` and wrap `CoreError`; the CLI
//! converges everything into `anyhow::Error`.

use thiserror::Error;

/// Errors that can be raised by any Compozy crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} is {from}, cannot move to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (missing reference, constraint violation).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Adding the dependency edge would close a cycle in the task graph.
    #[error("Cyclic dependency: task {task_id} cannot depend on {depends_on}")]
    CyclicDependency { task_id: String, depends_on: String },

    /// The entity changed between read and write.
    #[error(
        "Concurrent modification: {entity_type} {id} is no longer at version {expected_version}"
    )]
    ConcurrentModification {
        entity_type: String,
        id: String,
        expected_version: i64,
    },

    /// The acting user's role does not allow the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_reports_current_and_target() {
        let err = CoreError::InvalidTransition {
            entity_type: "problem".into(),
            id: "prb-1".into(),
            from: "prd_generation".into(),
            to: "draft".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("is prd_generation"));
        assert!(msg.contains("to draft"));
    }

    #[test]
    fn not_found_helper() {
        let err = CoreError::not_found("task", "tsk-9");
        assert_eq!(err.to_string(), "Entity not found: task tsk-9");
    }
}
