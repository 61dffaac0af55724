use compozy_core::enums::Priority;
use compozy_db::updates::ProblemUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    id: &str,
    title: Option<&str>,
    description: Option<&str>,
    priority: Option<&str>,
    workflow: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let mut builder = ProblemUpdateBuilder::new();
    if let Some(title) = title {
        builder = builder.title(title);
    }
    if let Some(description) = description {
        builder = builder.description(description);
    }
    if let Some(priority) = priority {
        builder = builder.priority(parse_enum::<Priority>(priority, "priority")?);
    }
    if let Some(workflow) = workflow {
        // An empty value clears the workflow id.
        let workflow = Some(workflow.trim())
            .filter(|w| !w.is_empty())
            .map(String::from);
        builder = builder.workflow_id(workflow);
    }

    let update = builder.build();
    if update.is_empty() {
        anyhow::bail!("problem update needs at least one of --title, --description, --priority, --workflow");
    }

    let problem = ctx.service.update_problem(id, update).await?;
    output(&problem, flags.format)
}
