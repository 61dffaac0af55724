use compozy_core::entities::{
    ChatMessage, Document, Organization, OrganizationMember, Problem, Repository, Task,
    TaskExecution, TransitionRecord,
};
use compozy_core::events::WorkflowEvent;
use compozy_core::responses::{BatchReport, ProblemOverview, TaskCounts};
use schemars::{Schema, schema_for};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

/// Names accepted by `cpz schema`.
pub const SCHEMA_NAMES: [&str; 13] = [
    "organization",
    "member",
    "repository",
    "problem",
    "task",
    "execution",
    "chat_message",
    "document",
    "transition",
    "workflow_event",
    "problem_overview",
    "task_counts",
    "batch_report",
];

#[derive(Debug, Serialize)]
struct SchemaListResponse {
    schemas: Vec<&'static str>,
}

/// Handle `cpz schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let name = args.type_name.trim().to_ascii_lowercase().replace('-', "_");
    if name == "list" {
        return output(
            &SchemaListResponse {
                schemas: SCHEMA_NAMES.to_vec(),
            },
            flags.format,
        );
    }

    let schema = schema_by_name(&name).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown schema '{}'; expected one of: {}",
            args.type_name,
            SCHEMA_NAMES.join(", ")
        )
    })?;
    output(&schema, flags.format)
}

fn schema_by_name(name: &str) -> Option<Schema> {
    let schema = match name {
        "organization" => schema_for!(Organization),
        "member" => schema_for!(OrganizationMember),
        "repository" => schema_for!(Repository),
        "problem" => schema_for!(Problem),
        "task" => schema_for!(Task),
        "execution" => schema_for!(TaskExecution),
        "chat_message" => schema_for!(ChatMessage),
        "document" => schema_for!(Document),
        "transition" => schema_for!(TransitionRecord),
        "workflow_event" => schema_for!(WorkflowEvent),
        "problem_overview" => schema_for!(ProblemOverview),
        "task_counts" => schema_for!(TaskCounts),
        "batch_report" => schema_for!(BatchReport),
        _ => return None,
    };
    Some(schema)
}
