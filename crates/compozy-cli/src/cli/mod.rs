use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `cpz` binary.
#[derive(Debug, Parser)]
#[command(name = "cpz", version, about = "Compozy - problem-to-code workflow engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database file (overrides `database.path`, disables `database.url`)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Actor recorded on transitions (overrides `general.default_actor`)
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Print emitted workflow events to stderr as JSON lines
    #[arg(long, global = true)]
    pub show_events: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
            db: self.db.clone(),
            actor: self.actor.clone(),
            show_events: self.show_events,
        }
    }
}
