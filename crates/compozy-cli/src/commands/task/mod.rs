mod create;
mod graph;
mod list;
mod transition;

use compozy_core::enums::{EntityType, Priority};
use compozy_db::updates::TaskUpdateBuilder;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TaskCommands;
use crate::commands::shared::history::print_history;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DeletedResponse<'a> {
    deleted: &'a str,
}

/// Handle `cpz task`.
pub async fn handle(
    action: &TaskCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        TaskCommands::Create {
            problem,
            title,
            description,
            spec,
            priority,
            order,
            depends_on,
        } => {
            create::run(
                problem,
                title,
                description.as_deref(),
                spec.as_deref(),
                priority.as_deref(),
                *order,
                depends_on,
                ctx,
                flags,
            )
            .await
        }
        TaskCommands::List { problem, status } => {
            list::run(problem, status.as_deref(), ctx, flags).await
        }
        TaskCommands::Get { id } => {
            let task = ctx.service.get_task(id).await?;
            output(&task, flags.format)
        }
        TaskCommands::Update {
            id,
            title,
            description,
            spec,
            priority,
            order,
        } => {
            let mut builder = TaskUpdateBuilder::new();
            if let Some(title) = title {
                builder = builder.title(title);
            }
            if let Some(description) = description {
                builder = builder.description(description);
            }
            if let Some(spec) = spec {
                builder = builder.spec(spec);
            }
            if let Some(priority) = priority {
                builder = builder.priority(parse_enum::<Priority>(priority, "priority")?);
            }
            if let Some(order) = order {
                builder = builder.order_index(*order);
            }
            let task = ctx.service.update_task(id, builder.build()).await?;
            output(&task, flags.format)
        }
        TaskCommands::Transition {
            id,
            status,
            reason,
            error,
        } => {
            transition::run_transition(id, status, reason.as_deref(), error.as_deref(), ctx, flags)
                .await
        }
        TaskCommands::BatchTransition {
            status,
            ids,
            reason,
        } => transition::run_batch(status, ids, reason.as_deref(), ctx, flags).await,
        TaskCommands::Reset { id } => transition::run_reset(id, ctx, flags).await,
        TaskCommands::Depend { id, on } => {
            let task = ctx.service.add_dependency(id, on).await?;
            output(&task, flags.format)
        }
        TaskCommands::Undepend { id, on } => {
            let task = ctx.service.remove_dependency(id, on).await?;
            output(&task, flags.format)
        }
        TaskCommands::Order { problem } => graph::run_order(problem, ctx, flags).await,
        TaskCommands::Ready { problem } => graph::run_ready(problem, ctx, flags).await,
        TaskCommands::History { id } => print_history(EntityType::Task, id, ctx, flags).await,
        TaskCommands::Delete { id } => {
            ctx.service.delete_task(id).await?;
            output(&DeletedResponse { deleted: id }, flags.format)
        }
    }
}
