use compozy_core::enums::Priority;
use compozy_db::repos::task::NewTask;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_opt_enum;
use crate::context::AppContext;
use crate::output::output;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    problem_id: &str,
    title: &str,
    description: Option<&str>,
    spec: Option<&str>,
    priority: Option<&str>,
    order_index: Option<i64>,
    depends_on: &[String],
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let new = NewTask {
        description: description.unwrap_or_default().to_string(),
        spec: spec.unwrap_or_default().to_string(),
        priority: parse_opt_enum::<Priority>(priority, "priority")?.unwrap_or_default(),
        order_index,
        dependencies: depends_on.to_vec(),
        ..NewTask::new(problem_id, title)
    };

    let task = ctx.service.create_task(new).await?;
    output(&task, flags.format)
}
