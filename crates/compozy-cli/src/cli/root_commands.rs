use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    ChatCommands, DocCommands, ExecCommands, MemberCommands, OrgCommands, ProblemCommands,
    RepoCommands, TaskCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Organizations.
    Org {
        #[command(subcommand)]
        action: OrgCommands,
    },
    /// Organization members and roles.
    Member {
        #[command(subcommand)]
        action: MemberCommands,
    },
    /// Source repositories.
    Repo {
        #[command(subcommand)]
        action: RepoCommands,
    },
    /// Problems and their workflow.
    Problem {
        #[command(subcommand)]
        action: ProblemCommands,
    },
    /// Tasks, dependencies and ordering.
    Task {
        #[command(subcommand)]
        action: TaskCommands,
    },
    /// Task execution attempts.
    Exec {
        #[command(subcommand)]
        action: ExecCommands,
    },
    /// Problem chat.
    Chat {
        #[command(subcommand)]
        action: ChatCommands,
    },
    /// PRD and technical spec documents.
    Doc {
        #[command(subcommand)]
        action: DocCommands,
    },
    /// Print the JSON Schema of a response type.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Type name, e.g. problem, task, workflow_event. `list` prints all names.
    pub type_name: String,
}
