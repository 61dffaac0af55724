use clap::Subcommand;

/// Organization commands.
#[derive(Clone, Debug, Subcommand)]
pub enum OrgCommands {
    /// Create an organization.
    Create {
        #[arg(long)]
        name: String,
        /// Lowercase letters, digits and dashes.
        #[arg(long)]
        slug: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List organizations.
    List,
    /// Get an organization by ID or slug.
    Get { id_or_slug: String },
    /// Mark an organization inactive.
    Deactivate { id: String },
    /// Mark an organization active.
    Activate { id: String },
    /// Delete an organization and everything it owns.
    Delete { id: String },
}
