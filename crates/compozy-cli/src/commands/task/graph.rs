use compozy_core::entities::Task;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct OrderResponse {
    problem_id: String,
    order: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    problem_id: String,
    ready: Vec<Task>,
}

pub async fn run_order(problem_id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let order = ctx.service.execution_order(problem_id).await?;
    output(
        &OrderResponse {
            problem_id: problem_id.to_string(),
            order,
        },
        flags.format,
    )
}

pub async fn run_ready(problem_id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let ready = ctx.service.ready_tasks(problem_id).await?;
    output(
        &ReadyResponse {
            problem_id: problem_id.to_string(),
            ready,
        },
        flags.format,
    )
}
