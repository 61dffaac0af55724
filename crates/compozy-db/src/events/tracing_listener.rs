use compozy_core::enums::{EntityType, EventKind, ProblemStatus};
use compozy_core::events::WorkflowEvent;
use compozy_core::progress::review_notice;

use super::EventListener;

/// Logs creations and status diffs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl EventListener for TracingListener {
    fn name(&self) -> &str {
        "tracing"
    }

    fn on_event(&self, event: &WorkflowEvent) -> anyhow::Result<()> {
        let old = event.old_status.as_deref().unwrap_or("-");
        match event.kind {
            EventKind::Created => tracing::info!(
                entity_type = %event.entity_type,
                entity_id = %event.entity_id,
                status = %event.new_status,
                actor = event.actor.as_deref(),
                "created"
            ),
            EventKind::Transitioned => tracing::info!(
                entity_type = %event.entity_type,
                entity_id = %event.entity_id,
                "{old} -> {}",
                event.new_status
            ),
            EventKind::Failed => tracing::warn!(
                entity_type = %event.entity_type,
                entity_id = %event.entity_id,
                reason = event.reason.as_deref(),
                "{old} -> {}",
                event.new_status
            ),
        }

        if event.entity_type == EntityType::Problem {
            let notice = serde_json::from_value::<ProblemStatus>(serde_json::Value::String(
                event.new_status.clone(),
            ))
            .ok()
            .and_then(review_notice);
            if let Some(notice) = notice {
                tracing::debug!(problem_id = %event.entity_id, "{notice}");
            }
        }
        Ok(())
    }
}
