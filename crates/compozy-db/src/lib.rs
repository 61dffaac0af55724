//! # compozy-db
//!
//! libSQL persistence for the Compozy workflow engine.
//!
//! Owns organizations, members, repositories, problems, tasks, executions,
//! chat messages, documents and status history. All status writes go through
//! one transactional, version-checked transition path in [`transition`], and
//! every successful transition is announced through [`events::EventNotifier`].

pub mod error;
pub mod events;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod transition;
pub mod updates;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;
use tokio::sync::{Mutex, MutexGuard};

/// Central database handle.
///
/// Wraps a libSQL database and its single connection. Writers take the
/// write gate so transactions on the shared connection never interleave.
///
/// Readers do not take the gate. A read that lands while another task holds
/// an open transaction on the connection sees that transaction's writes
/// before commit. Status and version change in a single `UPDATE`, so a read
/// never sees one without the other, but it may see a transition whose
/// commit later fails. Decisions that must not act on such a row (the
/// compare-and-swap) are made under the gate.
pub struct CompozyDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    write_gate: Mutex<()>,
}

impl CompozyDb {
    /// Open a local database file, or `":memory:"`.
    ///
    /// Applies the embedded schema on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the schema
    /// cannot be applied.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        Self::init(db).await
    }

    /// Open a remote libSQL database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection or schema bootstrap fails.
    pub async fn open_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await?;
        Self::init(db).await
    }

    async fn init(db: libsql::Database) -> Result<Self, DatabaseError> {
        let conn = db.connect()?;

        // Must be set per connection in SQLite.
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let compozy_db = Self {
            db,
            conn,
            write_gate: Mutex::new(()),
        };
        compozy_db.run_migrations().await?;
        Ok(compozy_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Serialize a writer. Hold the guard for the whole transaction.
    ///
    /// Not required for reads; see the type docs for what readers may see.
    pub async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"prb-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
