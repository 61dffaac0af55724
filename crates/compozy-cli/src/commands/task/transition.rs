use compozy_core::enums::TaskStatus;

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
    let target = parse_enum::<TaskStatus>(status, "status")?;
    let task = ctx.service.get_task(id).await?;
    let task = ctx
        .service
        .transition_task(&task, target, &transition_request(ctx, reason, error))
        .await?;
    output(&task, flags.format)
}

pub async fn run_batch(
    status: &str,
    ids: &[String],
    reason: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let target = parse_enum::<TaskStatus>(status, "status")?;
    let report = ctx
        .service
        .batch_transition_tasks(ids, target, &transition_request(ctx, reason, None))
        .await;
    output(&report, flags.format)
}

pub async fn run_reset(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let task = ctx.service.get_task(id).await?;
    let task = ctx
        .service
        .reset_task(&task, &transition_request(ctx, None, None))
        .await?;
    output(&task, flags.format)
}
