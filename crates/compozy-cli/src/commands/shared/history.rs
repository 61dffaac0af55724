use compozy_core::entities::TransitionRecord;
use compozy_core::enums::EntityType;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct HistoryResponse<'a> {
    entity_type: EntityType,
    entity_id: &'a str,
    transitions: Vec<TransitionRecord>,
}

/// Print the status history of one entity, oldest first.
pub async fn print_history(
    entity_type: EntityType,
    id: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let transitions = ctx.service.transition_history(entity_type, id).await?;
    output(
        &HistoryResponse {
            entity_type,
            entity_id: id,
            transitions,
        },
        flags.format,
    )
}
