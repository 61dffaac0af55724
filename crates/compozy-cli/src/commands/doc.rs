use anyhow::Context;
use compozy_core::entities::Document;
use compozy_core::enums::DocumentKind;
use compozy_db::repos::document::NewDocument;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::DocCommands;
use crate::commands::shared::parse::{parse_enum, parse_opt_enum};
use crate::commands::shared::request::require_actor;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DocumentListResponse {
    problem_id: String,
    documents: Vec<Document>,
}

/// Handle `cpz doc`.
pub async fn handle(
    action: &DocCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        DocCommands::Create {
            problem,
            kind,
            content,
            file,
            summary,
            notes,
        } => {
            let content = match (content, file) {
                (Some(content), _) => content.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read document content from {path}"))?,
                (None, None) => anyhow::bail!("doc create needs --content or --file"),
            };
            let document = ctx
                .service
                .create_document(NewDocument {
                    problem_id: problem.clone(),
                    kind: parse_enum::<DocumentKind>(kind, "kind")?,
                    content,
                    summary: summary.clone().unwrap_or_default(),
                    created_by: ctx.actor().map(String::from),
                    change_notes: notes.clone().unwrap_or_default(),
                })
                .await?;
            output(&document, flags.format)
        }
        DocCommands::List { problem, kind } => {
            let kind = parse_opt_enum::<DocumentKind>(kind.as_deref(), "kind")?;
            let documents = ctx.service.list_documents(problem, kind).await?;
            output(
                &DocumentListResponse {
                    problem_id: problem.clone(),
                    documents,
                },
                flags.format,
            )
        }
        DocCommands::Get { id } => {
            let document = ctx.service.get_document(id).await?;
            output(&document, flags.format)
        }
        DocCommands::Latest { problem, kind } => {
            let kind = parse_enum::<DocumentKind>(kind, "kind")?;
            let document = ctx.service.latest_document(problem, kind).await?;
            output(&document, flags.format)
        }
        DocCommands::Approve { id } => {
            let approver = require_actor(ctx, "approving a document")?;
            let document = ctx.service.approve_document(id, approver).await?;
            output(&document, flags.format)
        }
    }
}
