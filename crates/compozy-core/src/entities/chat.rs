use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AgentName, MessageType};

/// Author of a chat message: a human user or one of the workflow agents.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sender {
    User { user_id: String },
    Agent { agent: AgentName },
}

impl Sender {
    #[must_use]
    pub const fn is_agent(&self) -> bool {
        matches!(self, Self::Agent { .. })
    }

    /// Name shown next to the message.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::User { user_id } => user_id,
            Self::Agent { agent } => agent.display_name(),
        }
    }
}

/// A message in a problem's conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub problem_id: String,
    pub sender: Sender,
    pub content: String,
    pub message_type: MessageType,
    pub is_read: bool,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
