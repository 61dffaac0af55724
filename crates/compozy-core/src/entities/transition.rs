use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EntityType;

/// One row of status history. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TransitionRecord {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    /// `None` for the creation row.
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
