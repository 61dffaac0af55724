use compozy_core::enums::ProblemStatus;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_enum;
use crate::commands::shared::request::transition_request;
use crate::context::AppContext;
use crate::output::output;

pub async fn run_transition(
    id: &str,
    status: &str,
    reason: Option<&str>,
    error: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let target = parse_enum::<ProblemStatus>(status, "status")?;
    let problem = ctx.service.get_problem(id).await?;
    let request = transition_request(ctx, reason, error);
    let problem = ctx
        .service
        .transition_problem(&problem, target, &request)
        .await?;
    output(&problem, flags.format)
}

pub async fn run_batch(
    status: &str,
    ids: &[String],
    reason: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let target = parse_enum::<ProblemStatus>(status, "status")?;
    let request = transition_request(ctx, reason, None);
    let report = ctx
        .service
        .batch_transition_problems(ids, target, &request)
        .await;
    output(&report, flags.format)
}

pub async fn run_start(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let problem = ctx.service.get_problem(id).await?;
    let problem = ctx
        .service
        .start_analysis(&problem, &transition_request(ctx, None, None))
        .await?;
    output(&problem, flags.format)
}

pub async fn run_fail(
    id: &str,
    message: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let problem = ctx.service.get_problem(id).await?;
    let problem = ctx
        .service
        .mark_failed(&problem, message, &transition_request(ctx, None, None))
        .await?;
    output(&problem, flags.format)
}

pub async fn run_cancel(
    id: &str,
    reason: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let problem = ctx.service.get_problem(id).await?;
    let problem = ctx
        .service
        .cancel_problem(&problem, &transition_request(ctx, reason, None))
        .await?;
    output(&problem, flags.format)
}

pub async fn run_reopen(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let problem = ctx.service.get_problem(id).await?;
    let problem = ctx
        .service
        .reopen_problem(&problem, &transition_request(ctx, None, None))
        .await?;
    output(&problem, flags.format)
}
