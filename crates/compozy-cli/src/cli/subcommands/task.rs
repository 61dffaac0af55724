use clap::Subcommand;

/// Task commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TaskCommands {
    /// Create a task in pending.
    Create {
        #[arg(long)]
        problem: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        spec: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        order: Option<i64>,
        /// Task of the same problem this one depends on; repeatable.
        #[arg(long)]
        depends_on: Vec<String>,
    },
    /// List tasks of a problem by order.
    List {
        problem: String,
        #[arg(long)]
        status: Option<String>,
    },
    /// Get a task by ID.
    Get { id: String },
    /// Update descriptive fields.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        spec: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        order: Option<i64>,
    },
    /// Move a task to another status.
    Transition {
        id: String,
        status: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        error: Option<String>,
    },
    /// Move many tasks to one status. Each is attempted independently.
    BatchTransition {
        status: String,
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Return a task to pending.
    Reset { id: String },
    /// Add a dependency edge.
    Depend { id: String, on: String },
    /// Remove a dependency edge.
    Undepend { id: String, on: String },
    /// Dependency-respecting order of a problem's tasks.
    Order { problem: String },
    /// Tasks that can be picked up now.
    Ready { problem: String },
    /// Status history.
    History { id: String },
    /// Delete a task.
    Delete { id: String },
}
