//! Service layer orchestrating database mutations and event delivery.
//!
//! `WorkflowService` wraps `CompozyDb` (raw database access) and an
//! `EventNotifier`. All repo methods are implemented as `impl WorkflowService`.

use std::sync::Arc;

use compozy_config::CompozyConfig;

use crate::CompozyDb;
use crate::error::DatabaseError;
use crate::events::{EventListener, EventNotifier, JsonlEventSink, TracingListener};

/// Entry point for every workflow operation.
///
/// Mutations follow one protocol:
/// 1. Validate inputs and relationships
/// 2. Take the write gate and begin a transaction
/// 3. Execute SQL and append history rows
/// 4. Commit
/// 5. Emit events (best-effort)
pub struct WorkflowService {
    db: CompozyDb,
    notifier: EventNotifier,
}

impl WorkflowService {
    /// Open a local database with no listeners.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = CompozyDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Open the database described by `config` and register the configured
    /// listeners.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the JSONL
    /// directory cannot be created.
    pub async fn from_config(config: &CompozyConfig) -> Result<Self, DatabaseError> {
        let db = if config.database.is_remote() {
            CompozyDb::open_remote(&config.database.url, &config.database.auth_token).await?
        } else {
            if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
                if !parent.as_os_str().is_empty() && !config.database.is_in_memory() {
                    std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Other(e.into()))?;
                }
            }
            CompozyDb::open_local(&config.database.path).await?
        };

        let mut service = Self::from_db(db);
        if config.events.log_transitions {
            service.subscribe(Arc::new(TracingListener));
        }
        if let Some(dir) = config.events.jsonl_path() {
            service.subscribe(Arc::new(JsonlEventSink::new(dir)?));
        }
        Ok(service)
    }

    #[must_use]
    pub fn from_db(db: CompozyDb) -> Self {
        Self {
            db,
            notifier: EventNotifier::new(),
        }
    }

    /// Register a listener. Listeners run in registration order.
    pub fn subscribe(&mut self, listener: Arc<dyn EventListener>) {
        self.notifier.subscribe(listener);
    }

    #[must_use]
    pub const fn db(&self) -> &CompozyDb {
        &self.db
    }

    #[must_use]
    pub const fn notifier(&self) -> &EventNotifier {
        &self.notifier
    }
}
