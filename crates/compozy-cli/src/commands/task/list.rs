use compozy_core::entities::Task;
use compozy_core::enums::TaskStatus;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_opt_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct TaskListResponse {
    problem_id: String,
    tasks: Vec<Task>,
}

pub async fn run(
    problem_id: &str,
    status: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let status = parse_opt_enum::<TaskStatus>(status, "status")?;

    let mut tasks = ctx.service.list_tasks(problem_id).await?;
    if let Some(status) = status {
        tasks.retain(|task| task.status == status);
    }
    if let Some(limit) = flags.limit {
        tasks.truncate(usize::try_from(limit)?);
    }

    output(
        &TaskListResponse {
            problem_id: problem_id.to_string(),
            tasks,
        },
        flags.format,
    )
}
