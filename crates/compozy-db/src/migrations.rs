//! Schema bootstrap.
//!
//! Embeds the SQL schema at compile time and executes it on open. Every
//! statement uses `IF NOT EXISTS`, so re-running is a no-op.

use crate::CompozyDb;
use crate::error::DatabaseError;

/// Initial schema: 11 tables, 13 indexes.
const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

impl CompozyDb {
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_initial: {e}")))?;
        Ok(())
    }
}
