use compozy_core::enums::Priority;
use compozy_db::repos::problem::NewProblem;

use crate::cli::GlobalFlags;
use crate::commands::org::resolve_organization;
use crate::commands::shared::parse::parse_opt_enum;
use crate::context::AppContext;
use crate::output::output;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    org: &str,
    title: &str,
    description: Option<&str>,
    priority: Option<&str>,
    repositories: &[String],
    workflow: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let org = resolve_organization(ctx, org).await?;
    let priority = parse_opt_enum::<Priority>(priority, "priority")?.unwrap_or_default();

    let problem = ctx
        .service
        .create_problem(NewProblem {
            organization_id: org.id,
            title: title.to_string(),
            description: description.unwrap_or_default().to_string(),
            priority,
            created_by: ctx.actor().map(String::from),
            repository_ids: repositories.to_vec(),
            workflow_id: workflow.map(String::from),
        })
        .await?;
    output(&problem, flags.format)
}
