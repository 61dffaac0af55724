//! Database error types for compozy-db.

use compozy_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A SQL query failed or a column held unexpected data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema bootstrap failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<libsql::Error> for DatabaseError {
    /// Constraint violations surface as validation errors so callers see one
    /// error kind for "this input is not acceptable".
    fn from(err: libsql::Error) -> Self {
        let message = err.to_string();
        if let Some(detail) = constraint_detail(&message, "UNIQUE constraint failed: ") {
            return Self::Core(CoreError::Validation(format!("duplicate value for {detail}")));
        }
        if message.contains("FOREIGN KEY constraint failed") {
            return Self::Core(CoreError::Validation(
                "referenced entity does not exist".into(),
            ));
        }
        if let Some(detail) = constraint_detail(&message, "CHECK constraint failed: ") {
            return Self::Core(CoreError::Validation(format!("check failed: {detail}")));
        }
        Self::LibSql(err)
    }
}

fn constraint_detail<'a>(message: &'a str, marker: &str) -> Option<&'a str> {
    message
        .find(marker)
        .map(|pos| message[pos + marker.len()..].trim())
}

impl DatabaseError {
    /// The domain error inside, if any.
    #[must_use]
    pub const fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(CoreError::NotFound { .. }) | Self::NoResult)
    }
}
