use compozy_core::entities::Organization;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::OrgCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct OrganizationListResponse {
    organizations: Vec<Organization>,
}

#[derive(Debug, Serialize)]
struct DeletedResponse<'a> {
    deleted: &'a str,
}

/// Handle `cpz org`.
pub async fn handle(
    action: &OrgCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        OrgCommands::Create {
            name,
            slug,
            description,
        } => {
            let org = ctx
                .service
                .create_organization(name, slug, description.as_deref())
                .await?;
            output(&org, flags.format)
        }
        OrgCommands::List => {
            let organizations = ctx.service.list_organizations().await?;
            output(&OrganizationListResponse { organizations }, flags.format)
        }
        OrgCommands::Get { id_or_slug } => {
            let org = resolve_organization(ctx, id_or_slug).await?;
            output(&org, flags.format)
        }
        OrgCommands::Deactivate { id } => {
            let org = ctx.service.set_organization_active(id, false).await?;
            output(&org, flags.format)
        }
        OrgCommands::Activate { id } => {
            let org = ctx.service.set_organization_active(id, true).await?;
            output(&org, flags.format)
        }
        OrgCommands::Delete { id } => {
            ctx.service.delete_organization(id).await?;
            output(&DeletedResponse { deleted: id }, flags.format)
        }
    }
}

/// Look up by ID first, falling back to slug.
pub async fn resolve_organization(ctx: &AppContext, id_or_slug: &str) -> anyhow::Result<Organization> {
    if id_or_slug.starts_with("org-") {
        if let Ok(org) = ctx.service.get_organization(id_or_slug).await {
            return Ok(org);
        }
    }
    Ok(ctx.service.get_organization_by_slug(id_or_slug).await?)
}
