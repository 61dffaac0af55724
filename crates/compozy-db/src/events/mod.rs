//! In-process delivery of workflow events.
//!
//! Listeners are invoked synchronously, in registration order, after the
//! state change has been committed. A listener that returns an error or
//! panics is logged and skipped; the state change is never rolled back and
//! the remaining listeners still run.

mod jsonl;
mod recording;
mod tracing_listener;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use compozy_core::events::WorkflowEvent;

pub use jsonl::JsonlEventSink;
pub use recording::RecordingListener;
pub use tracing_listener::TracingListener;

/// Receives workflow events.
pub trait EventListener: Send + Sync {
    /// Name used in logs when the listener fails.
    fn name(&self) -> &str;

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Any error is logged by the notifier and otherwise ignored.
    fn on_event(&self, event: &WorkflowEvent) -> anyhow::Result<()>;
}

/// Ordered set of listeners.
#[derive(Default, Clone)]
pub struct EventNotifier {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn EventListener>) {
        tracing::debug!(listener = listener.name(), "event listener registered");
        self.listeners.push(listener);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener. Never fails.
    pub fn emit(&self, event: &WorkflowEvent) {
        for listener in &self.listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(
                    listener = listener.name(),
                    entity_id = %event.entity_id,
                    error = %e,
                    "event listener failed"
                ),
                Err(_) => tracing::warn!(
                    listener = listener.name(),
                    entity_id = %event.entity_id,
                    "event listener panicked"
                ),
            }
        }
    }
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|l| l.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use compozy_core::enums::ProblemStatus;

    struct Failing;

    impl EventListener for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_event(&self, _event: &WorkflowEvent) -> anyhow::Result<()> {
            anyhow::bail!("sink offline")
        }
    }

    struct Panicking;

    impl EventListener for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn on_event(&self, _event: &WorkflowEvent) -> anyhow::Result<()> {
            panic!("listener bug")
        }
    }

    fn event() -> WorkflowEvent {
        WorkflowEvent::transition(
            "prb-1",
            ProblemStatus::Draft,
            ProblemStatus::Analyzing,
            None,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn failures_do_not_stop_later_listeners() {
        let recorder = Arc::new(RecordingListener::new());
        let mut notifier = EventNotifier::new();
        notifier.subscribe(Arc::new(Failing));
        notifier.subscribe(Arc::new(Panicking));
        notifier.subscribe(recorder.clone());

        notifier.emit(&event());

        assert_eq!(recorder.events().len(), 1);
        assert_eq!(notifier.len(), 3);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let first = Arc::new(RecordingListener::named("first"));
        let second = Arc::new(RecordingListener::named("second"));
        let mut notifier = EventNotifier::new();
        notifier.subscribe(first.clone());
        notifier.subscribe(second.clone());
        notifier.emit(&event());
        assert_eq!(first.events(), second.events());
        assert!(format!("{notifier:?}").contains("first"));
    }
}
