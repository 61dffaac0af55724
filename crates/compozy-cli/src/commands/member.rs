use compozy_core::entities::OrganizationMember;
use compozy_core::enums::MemberRole;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::MemberCommands;
use crate::commands::org::resolve_organization;
use crate::commands::shared::parse::parse_enum;
use crate::commands::shared::request::require_actor;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct MemberListResponse {
    organization_id: String,
    members: Vec<OrganizationMember>,
}

#[derive(Debug, Serialize)]
struct RemovedResponse<'a> {
    organization_id: &'a str,
    removed: &'a str,
}

/// Handle `cpz member`.
pub async fn handle(
    action: &MemberCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        MemberCommands::Add { org, user, role } => {
            let org = resolve_organization(ctx, org).await?;
            let role = parse_enum::<MemberRole>(role, "role")?;
            // The first member bootstraps the organization without an inviter.
            let existing = ctx.service.list_members(&org.id).await?;
            let invited_by = if existing.is_empty() {
                None
            } else {
                Some(require_actor(ctx, "adding a member")?)
            };
            let member = ctx
                .service
                .add_member(&org.id, user, role, invited_by)
                .await?;
            output(&member, flags.format)
        }
        MemberCommands::List { org } => {
            let org = resolve_organization(ctx, org).await?;
            let members = ctx.service.list_members(&org.id).await?;
            output(
                &MemberListResponse {
                    organization_id: org.id,
                    members,
                },
                flags.format,
            )
        }
        MemberCommands::Role { org, user, role } => {
            let org = resolve_organization(ctx, org).await?;
            let role = parse_enum::<MemberRole>(role, "role")?;
            let acting = require_actor(ctx, "changing a role")?;
            let member = ctx
                .service
                .update_member_role(&org.id, user, role, acting)
                .await?;
            output(&member, flags.format)
        }
        MemberCommands::Remove { org, user } => {
            let org = resolve_organization(ctx, org).await?;
            let acting = require_actor(ctx, "removing a member")?;
            ctx.service.remove_member(&org.id, user, acting).await?;
            output(
                &RemovedResponse {
                    organization_id: &org.id,
                    removed: user,
                },
                flags.format,
            )
        }
    }
}
