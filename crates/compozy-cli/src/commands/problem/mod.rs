mod create;
mod list;
mod transition;
mod update;

use compozy_core::enums::EntityType;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ProblemCommands;
use crate::commands::shared::history::print_history;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DeletedResponse<'a> {
    deleted: &'a str,
}

/// Handle `cpz problem`.
pub async fn handle(
    action: &ProblemCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ProblemCommands::Create {
            org,
            title,
            description,
            priority,
            repo,
            workflow,
        } => {
            create::run(
                org,
                title,
                description.as_deref(),
                priority.as_deref(),
                repo,
                workflow.as_deref(),
                ctx,
                flags,
            )
            .await
        }
        ProblemCommands::List { org, status } => {
            list::run(org.as_deref(), status.as_deref(), ctx, flags).await
        }
        ProblemCommands::Get { id } => {
            let problem = ctx.service.get_problem(id).await?;
            output(&problem, flags.format)
        }
        ProblemCommands::Update {
            id,
            title,
            description,
            priority,
            workflow,
        } => {
            update::run(
                id,
                title.as_deref(),
                description.as_deref(),
                priority.as_deref(),
                workflow.as_deref(),
                ctx,
                flags,
            )
            .await
        }
        ProblemCommands::Transition {
            id,
            status,
            reason,
            error,
        } => {
            transition::run_transition(id, status, reason.as_deref(), error.as_deref(), ctx, flags)
                .await
        }
        ProblemCommands::BatchTransition {
            status,
            ids,
            reason,
        } => transition::run_batch(status, ids, reason.as_deref(), ctx, flags).await,
        ProblemCommands::Start { id } => transition::run_start(id, ctx, flags).await,
        ProblemCommands::Fail { id, message } => {
            transition::run_fail(id, message, ctx, flags).await
        }
        ProblemCommands::Cancel { id, reason } => {
            transition::run_cancel(id, reason.as_deref(), ctx, flags).await
        }
        ProblemCommands::Reopen { id } => transition::run_reopen(id, ctx, flags).await,
        ProblemCommands::Overview { id } => {
            let overview = ctx.service.problem_overview(id).await?;
            output(&overview, flags.format)
        }
        ProblemCommands::History { id } => {
            print_history(EntityType::Problem, id, ctx, flags).await
        }
        ProblemCommands::Link { id, repo } => {
            let problem = ctx.service.link_repository(id, repo).await?;
            output(&problem, flags.format)
        }
        ProblemCommands::Unlink { id, repo } => {
            let problem = ctx.service.unlink_repository(id, repo).await?;
            output(&problem, flags.format)
        }
        ProblemCommands::Delete { id } => {
            ctx.service.delete_problem(id).await?;
            output(&DeletedResponse { deleted: id }, flags.format)
        }
    }
}
