//! Entity structs for all Compozy domain objects.
//!
//! Each entity maps to a table in the libSQL store. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip and schema
//! validation.

mod chat;
mod document;
mod execution;
mod organization;
mod problem;
mod task;
mod transition;

pub use chat::{ChatMessage, Sender};
pub use document::Document;
pub use execution::TaskExecution;
pub use organization::{Organization, OrganizationMember, Repository};
pub use problem::Problem;
pub use task::Task;
pub use transition::TransitionRecord;
