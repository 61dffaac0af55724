use clap::Subcommand;

/// Chat commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ChatCommands {
    /// Post a message as a user (default: --actor) or an agent.
    Post {
        #[arg(long)]
        problem: String,
        #[arg(long)]
        content: String,
        #[arg(long, conflicts_with = "agent")]
        user: Option<String>,
        #[arg(long)]
        agent: Option<String>,
        /// question, answer, info, error or system
        #[arg(long = "type", default_value = "info")]
        message_type: String,
    },
    /// Messages of a problem in posting order.
    List {
        problem: String,
        #[arg(long)]
        unread: bool,
    },
    /// Mark messages read (or unread).
    Read {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        unread: bool,
    },
    /// Number of unread messages.
    Unread { problem: String },
    /// Delete a message.
    Delete { id: String },
}
