use clap::Subcommand;

/// Repository commands.
#[derive(Clone, Debug, Subcommand)]
pub enum RepoCommands {
    /// Register a repository with an organization.
    Add {
        #[arg(long)]
        org: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        /// github, gitlab or bitbucket
        #[arg(long, default_value = "github")]
        provider: String,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        private: bool,
    },
    /// List repositories of an organization.
    List { org: String },
    /// Get a repository by ID.
    Get { id: String },
    /// Record a completed sync.
    Synced {
        id: String,
        #[arg(long)]
        path: Option<String>,
    },
    /// Delete a repository.
    Delete { id: String },
}
