//! JSONL event sink.
//!
//! Appends each event to `{dir}/{entity_type}.jsonl`. Uses
//! `serde_jsonlines::append_json_lines` for per-line appends.

use std::path::{Path, PathBuf};

use compozy_core::events::WorkflowEvent;

use super::EventListener;
use crate::error::DatabaseError;

/// Appends events to per-entity-type JSONL files.
#[derive(Debug, Clone)]
pub struct JsonlEventSink {
    dir: PathBuf,
}

impl JsonlEventSink {
    /// Create a sink writing into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that events for `entity_type` are appended to.
    #[must_use]
    pub fn path_for(&self, event: &WorkflowEvent) -> PathBuf {
        self.dir.join(format!("{}.jsonl", event.entity_type))
    }

    /// Read back every event written for one entity type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file exists but cannot be parsed.
    pub fn read(&self, entity_type: &str) -> Result<Vec<WorkflowEvent>, DatabaseError> {
        let path = self.dir.join(format!("{entity_type}.jsonl"));
        if !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines(&path)
            .map_err(|e| DatabaseError::Other(e.into()))?
            .collect::<std::io::Result<Vec<WorkflowEvent>>>()
            .map_err(|e| DatabaseError::Other(e.into()))
    }
}

impl EventListener for JsonlEventSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn on_event(&self, event: &WorkflowEvent) -> anyhow::Result<()> {
        serde_jsonlines::append_json_lines(self.path_for(event), [event])?;
        Ok(())
    }
}
