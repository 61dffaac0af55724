use clap::Subcommand;

/// Organization membership commands.
#[derive(Clone, Debug, Subcommand)]
pub enum MemberCommands {
    /// Add a user to an organization. The acting user must be an admin
    /// unless the organization has no members yet.
    Add {
        org: String,
        user: String,
        /// admin, member or viewer
        #[arg(long, default_value = "member")]
        role: String,
    },
    /// List members of an organization.
    List { org: String },
    /// Change a member's role. Requires admin.
    Role {
        org: String,
        user: String,
        #[arg(long)]
        role: String,
    },
    /// Remove a member.
    Remove { org: String, user: String },
}
