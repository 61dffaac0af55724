use clap::Subcommand;

/// Problem commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ProblemCommands {
    /// Create a problem in draft.
    Create {
        #[arg(long)]
        org: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Repository to link; repeatable.
        #[arg(long)]
        repo: Vec<String>,
        #[arg(long)]
        workflow: Option<String>,
    },
    /// List problems, newest first.
    List {
        #[arg(long)]
        org: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Get a problem by ID.
    Get { id: String },
    /// Update title, description, priority or workflow id.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        workflow: Option<String>,
    },
    /// Move a problem to another status.
    Transition {
        id: String,
        status: String,
        #[arg(long)]
        reason: Option<String>,
        /// Stored when the target is `failed`.
        #[arg(long)]
        error: Option<String>,
    },
    /// Move many problems to one status. Each is attempted independently.
    BatchTransition {
        status: String,
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// draft -> analyzing.
    Start { id: String },
    /// Mark a problem failed.
    Fail {
        id: String,
        #[arg(long)]
        message: String,
    },
    /// Cancel a problem.
    Cancel {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// failed | cancelled -> draft.
    Reopen { id: String },
    /// Progress, task counts, unread messages and latest documents.
    Overview { id: String },
    /// Status history.
    History { id: String },
    /// Link a repository.
    Link { id: String, repo: String },
    /// Unlink a repository.
    Unlink { id: String, repo: String },
    /// Delete a problem and everything it owns.
    Delete { id: String },
}
