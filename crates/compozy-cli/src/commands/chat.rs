use compozy_core::entities::{ChatMessage, Sender};
use compozy_core::enums::{AgentName, MessageType};
use compozy_db::repos::chat::NewMessage;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ChatCommands;
use crate::commands::shared::parse::parse_enum;
use crate::commands::shared::request::require_actor;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct MessageListResponse {
    problem_id: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct UnreadResponse {
    problem_id: String,
    unread: u32,
}

#[derive(Debug, Serialize)]
struct DeletedResponse<'a> {
    deleted: &'a str,
}

/// Handle `cpz chat`.
pub async fn handle(
    action: &ChatCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ChatCommands::Post {
            problem,
            content,
            user,
            agent,
            message_type,
        } => {
            let sender = resolve_sender(ctx, user.as_deref(), agent.as_deref())?;
            let message_type = parse_enum::<MessageType>(message_type, "message type")?;
            let message = ctx
                .service
                .post_message(NewMessage::new(problem, sender, content).of_type(message_type))
                .await?;
            output(&message, flags.format)
        }
        ChatCommands::List { problem, unread } => {
            let mut messages = ctx.service.list_messages(problem, *unread).await?;
            if let Some(limit) = flags.limit {
                messages.truncate(usize::try_from(limit)?);
            }
            output(
                &MessageListResponse {
                    problem_id: problem.clone(),
                    messages,
                },
                flags.format,
            )
        }
        ChatCommands::Read { ids, unread } => {
            let report = ctx.service.batch_mark_messages(ids, !*unread).await;
            output(&report, flags.format)
        }
        ChatCommands::Unread { problem } => {
            let unread = ctx.service.unread_count(problem).await?;
            output(
                &UnreadResponse {
                    problem_id: problem.clone(),
                    unread,
                },
                flags.format,
            )
        }
        ChatCommands::Delete { id } => {
            ctx.service.delete_message(id).await?;
            output(&DeletedResponse { deleted: id }, flags.format)
        }
    }
}

fn resolve_sender(
    ctx: &AppContext,
    user: Option<&str>,
    agent: Option<&str>,
) -> anyhow::Result<Sender> {
    if let Some(agent) = agent {
        return Ok(Sender::Agent {
            agent: parse_enum::<AgentName>(agent, "agent")?,
        });
    }
    let user_id = match user {
        Some(user) => user,
        None => require_actor(ctx, "posting a message")?,
    };
    Ok(Sender::User {
        user_id: user_id.to_string(),
    })
}
