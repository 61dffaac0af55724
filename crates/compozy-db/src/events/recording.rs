use std::sync::{Mutex, PoisonError};

use compozy_core::enums::EventKind;
use compozy_core::events::WorkflowEvent;

use super::EventListener;

/// Keeps every event in memory.
#[derive(Debug)]
pub struct RecordingListener {
    name: String,
    events: Mutex<Vec<WorkflowEvent>>,
}

impl Default for RecordingListener {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingListener {
    #[must_use]
    pub fn new() -> Self {
        Self::named("recording")
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn count_of(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventListener for RecordingListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &WorkflowEvent) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}
