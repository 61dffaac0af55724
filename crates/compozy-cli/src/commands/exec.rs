use compozy_core::entities::TaskExecution;
use compozy_core::enums::{AgentType, EntityType, ExecutionStatus};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ExecCommands;
use crate::commands::shared::history::print_history;
use crate::commands::shared::parse::{parse_enum, parse_json};
use crate::commands::shared::request::transition_request;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ExecutionListResponse {
    task_id: String,
    executions: Vec<TaskExecution>,
}

/// Handle `cpz exec`.
pub async fn handle(
    action: &ExecCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ExecCommands::Create { task, agent, job } => {
            let agent = parse_enum::<AgentType>(agent, "agent")?;
            let execution = ctx
                .service
                .create_execution(task, agent, job.as_deref())
                .await?;
            output(&execution, flags.format)
        }
        ExecCommands::List { task } => {
            let executions = ctx.service.list_executions(task).await?;
            output(
                &ExecutionListResponse {
                    task_id: task.clone(),
                    executions,
                },
                flags.format,
            )
        }
        ExecCommands::Get { id } => {
            let execution = ctx.service.get_execution(id).await?;
            output(&execution, flags.format)
        }
        ExecCommands::FindJob { job } => {
            let execution = ctx.service.find_execution_by_job(job).await?;
            output(&execution, flags.format)
        }
        ExecCommands::Log { id, text } => {
            let execution = ctx.service.append_execution_logs(id, text).await?;
            output(&execution, flags.format)
        }
        ExecCommands::Report {
            id,
            output: result,
            metrics,
        } => {
            if result.is_none() && metrics.is_none() {
                anyhow::bail!("exec report needs --output, --metrics or both");
            }
            let result = result
                .as_deref()
                .map(|raw| parse_json(raw, "output"))
                .transpose()?;
            let metrics = metrics
                .as_deref()
                .map(|raw| parse_json(raw, "metrics"))
                .transpose()?;
            let execution = ctx
                .service
                .record_execution_result(id, result.as_ref(), metrics.as_ref())
                .await?;
            output(&execution, flags.format)
        }
        ExecCommands::Transition {
            id,
            status,
            reason,
            error,
        } => {
            let target = parse_enum::<ExecutionStatus>(status, "status")?;
            let execution = ctx.service.get_execution(id).await?;
            let execution = ctx
                .service
                .transition_execution(
                    &execution,
                    target,
                    &transition_request(ctx, reason.as_deref(), error.as_deref()),
                )
                .await?;
            output(&execution, flags.format)
        }
        ExecCommands::History { id } => {
            print_history(EntityType::Execution, id, ctx, flags).await
        }
    }
}
