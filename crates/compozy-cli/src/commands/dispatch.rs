use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Org { action } => commands::org::handle(&action, ctx, flags).await,
        Commands::Member { action } => commands::member::handle(&action, ctx, flags).await,
        Commands::Repo { action } => commands::repo::handle(&action, ctx, flags).await,
        Commands::Problem { action } => commands::problem::handle(&action, ctx, flags).await,
        Commands::Task { action } => commands::task::handle(&action, ctx, flags).await,
        Commands::Exec { action } => commands::exec::handle(&action, ctx, flags).await,
        Commands::Chat { action } => commands::chat::handle(&action, ctx, flags).await,
        Commands::Doc { action } => commands::doc::handle(&action, ctx, flags).await,
        Commands::Schema(args) => commands::schema::handle(&args, flags),
    }
}

#[cfg(test)]
mod tests {
    use compozy_config::CompozyConfig;
    use compozy_core::entities::Problem;
    use compozy_core::enums::{EventKind, MemberRole, Priority, ProblemStatus, TaskStatus};
    use compozy_db::repos::problem::NewProblem;
    use compozy_db::repos::task::NewTask;
    use pretty_assertions::assert_eq;

    use super::dispatch;
    use crate::cli::GlobalFlags;
    use crate::cli::root_commands::Commands;
    use crate::cli::subcommands::{MemberCommands, ProblemCommands, TaskCommands};
    use crate::context::AppContext;

    fn flags() -> GlobalFlags {
        GlobalFlags {
            actor: Some("ops-1".to_string()),
            show_events: true,
            ..GlobalFlags::default()
        }
    }

    async fn context(flags: &GlobalFlags) -> AppContext {
        let mut config = CompozyConfig::default();
        config.database.path = ":memory:".to_string();
        config.events.log_transitions = false;
        AppContext::init(config, flags)
            .await
            .expect("context should initialize")
    }

    async fn draft_problem(ctx: &AppContext) -> Problem {
        let org = ctx
            .service
            .create_organization("Acme", "acme", None)
            .await
            .expect("org");
        ctx.service
            .create_problem(NewProblem {
                organization_id: org.id,
                title: "Checkout times out".to_string(),
                description: String::new(),
                priority: Priority::High,
                created_by: None,
                repository_ids: Vec::new(),
                workflow_id: None,
            })
            .await
            .expect("problem")
    }

    #[tokio::test]
    async fn start_moves_problem_to_analyzing_as_actor() {
        let flags = flags();
        let ctx = context(&flags).await;
        let problem = draft_problem(&ctx).await;

        dispatch(
            Commands::Problem {
                action: ProblemCommands::Start {
                    id: problem.id.clone(),
                },
            },
            &ctx,
            &flags,
        )
        .await
        .expect("start should succeed");

        let stored = ctx.service.get_problem(&problem.id).await.expect("stored");
        assert_eq!(stored.status, ProblemStatus::Analyzing);
        assert_eq!(stored.version, 2);

        let events = ctx.recorded_events();
        let last = events.last().expect("transition event");
        assert_eq!(last.kind, EventKind::Transitioned);
        assert_eq!(last.actor.as_deref(), Some("ops-1"));
    }

    #[tokio::test]
    async fn unreachable_status_is_rejected() {
        let flags = flags();
        let ctx = context(&flags).await;
        let problem = draft_problem(&ctx).await;

        let err = dispatch(
            Commands::Problem {
                action: ProblemCommands::Transition {
                    id: problem.id.clone(),
                    status: "testing".to_string(),
                    reason: None,
                    error: None,
                },
            },
            &ctx,
            &flags,
        )
        .await
        .expect_err("draft cannot jump to testing");
        assert!(err.to_string().contains("Invalid state transition"));

        let stored = ctx.service.get_problem(&problem.id).await.expect("stored");
        assert_eq!(stored.status, ProblemStatus::Draft);
    }

    #[tokio::test]
    async fn hyphenated_task_status_is_accepted() {
        let flags = flags();
        let ctx = context(&flags).await;
        let problem = draft_problem(&ctx).await;
        let task = ctx
            .service
            .create_task(NewTask::new(&problem.id, "Add retry"))
            .await
            .expect("task");

        for status in ["selected", "in-progress"] {
            dispatch(
                Commands::Task {
                    action: TaskCommands::Transition {
                        id: task.id.clone(),
                        status: status.to_string(),
                        reason: None,
                        error: None,
                    },
                },
                &ctx,
                &flags,
            )
            .await
            .expect("transition should succeed");
        }

        let stored = ctx.service.get_task(&task.id).await.expect("stored");
        assert_eq!(stored.status, TaskStatus::InProgress);
        assert!(stored.started_at.is_some());
    }

    #[tokio::test]
    async fn first_member_needs_no_inviter() {
        let flags = flags();
        let ctx = context(&flags).await;
        let org = ctx
            .service
            .create_organization("Acme", "acme", None)
            .await
            .expect("org");

        let add = |user: &str, role: &str| Commands::Member {
            action: MemberCommands::Add {
                org: "acme".to_string(),
                user: user.to_string(),
                role: role.to_string(),
            },
        };

        dispatch(add("ops-1", "admin"), &ctx, &flags)
            .await
            .expect("bootstrap member");
        dispatch(add("dev-2", "member"), &ctx, &flags)
            .await
            .expect("admin actor may invite");

        let members = ctx.service.list_members(&org.id).await.expect("members");
        assert_eq!(members.len(), 2);
        let invited = members
            .iter()
            .find(|m| m.user_id == "dev-2")
            .expect("dev-2");
        assert_eq!(invited.role, MemberRole::Member);
        assert_eq!(invited.invited_by.as_deref(), Some("ops-1"));
    }
}
