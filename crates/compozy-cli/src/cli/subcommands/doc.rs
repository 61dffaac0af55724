use clap::Subcommand;

/// Document commands.
#[derive(Clone, Debug, Subcommand)]
pub enum DocCommands {
    /// Store a new document version.
    Create {
        #[arg(long)]
        problem: String,
        /// prd or tech_spec
        #[arg(long)]
        kind: String,
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,
        /// Read content from a file.
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Documents of a problem, newest version first.
    List {
        problem: String,
        #[arg(long)]
        kind: Option<String>,
    },
    /// Get a document by ID.
    Get { id: String },
    /// Newest version of one kind.
    Latest {
        problem: String,
        #[arg(long)]
        kind: String,
    },
    /// Approve a document as the acting user.
    Approve { id: String },
}
