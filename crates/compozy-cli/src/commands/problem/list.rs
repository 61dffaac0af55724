use compozy_core::entities::Problem;
use compozy_core::enums::ProblemStatus;
use compozy_db::repos::problem::ProblemFilter;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::org::resolve_organization;
use crate::commands::shared::parse::parse_opt_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ProblemListResponse {
    problems: Vec<Problem>,
}

pub async fn run(
    org: Option<&str>,
    status: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let organization_id = match org {
        Some(org) => Some(resolve_organization(ctx, org).await?.id),
        None => None,
    };
    let filter = ProblemFilter {
        organization_id,
        status: parse_opt_enum::<ProblemStatus>(status, "status")?,
        limit: Some(flags.limit.unwrap_or(ctx.config.general.default_limit)),
    };

    let problems = ctx.service.list_problems(&filter).await?;
    output(&ProblemListResponse { problems }, flags.format)
}
