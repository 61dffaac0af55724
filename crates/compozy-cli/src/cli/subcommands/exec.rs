use clap::Subcommand;

/// Task execution commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ExecCommands {
    /// Queue a new attempt for a task.
    Create {
        #[arg(long)]
        task: String,
        #[arg(long, default_value = "unknown")]
        agent: String,
        #[arg(long)]
        job: Option<String>,
    },
    /// List attempts of a task.
    List { task: String },
    /// Get an execution by ID.
    Get { id: String },
    /// Find the execution of an external job.
    FindJob { job: String },
    /// Append to the execution log.
    Log { id: String, text: String },
    /// Record output and metrics (JSON).
    Report {
        id: String,
        #[arg(long)]
        output: Option<String>,
        #[arg(long)]
        metrics: Option<String>,
    },
    /// Move an execution to another status.
    Transition {
        id: String,
        status: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        error: Option<String>,
    },
    /// Status history.
    History { id: String },
}
