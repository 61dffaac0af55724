use compozy_core::entities::Repository;
use compozy_core::enums::RepoProvider;
use compozy_db::repos::repository::NewRepository;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::RepoCommands;
use crate::commands::org::resolve_organization;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct RepositoryListResponse {
    repositories: Vec<Repository>,
}

#[derive(Debug, Serialize)]
struct DeletedResponse<'a> {
    deleted: &'a str,
}

/// Handle `cpz repo`.
pub async fn handle(
    action: &RepoCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        RepoCommands::Add {
            org,
            name,
            url,
            provider,
            branch,
            token,
            private,
        } => {
            let org = resolve_organization(ctx, org).await?;
            let repo = ctx
                .service
                .add_repository(NewRepository {
                    organization_id: org.id,
                    name: name.clone(),
                    url: url.clone(),
                    provider: parse_enum::<RepoProvider>(provider, "provider")?,
                    default_branch: branch.clone(),
                    auth_token: token.clone(),
                    is_private: *private,
                    local_path: None,
                })
                .await?;
            output(&repo, flags.format)
        }
        RepoCommands::List { org } => {
            let org = resolve_organization(ctx, org).await?;
            let repositories = ctx.service.list_repositories(&org.id).await?;
            output(&RepositoryListResponse { repositories }, flags.format)
        }
        RepoCommands::Get { id } => {
            let repo = ctx.service.get_repository(id).await?;
            output(&repo, flags.format)
        }
        RepoCommands::Synced { id, path } => {
            let repo = ctx
                .service
                .mark_repository_synced(id, path.as_deref())
                .await?;
            output(&repo, flags.format)
        }
        RepoCommands::Delete { id } => {
            ctx.service.delete_repository(id).await?;
            output(&DeletedResponse { deleted: id }, flags.format)
        }
    }
}
