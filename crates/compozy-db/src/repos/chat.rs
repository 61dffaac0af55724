//! Chat message repository: the conversation between users and agents on a problem.

use chrono::Utc;

use compozy_core::entities::{ChatMessage, Sender};
use compozy_core::enums::MessageType;
use compozy_core::errors::CoreError;
use compozy_core::ids::PREFIX_MESSAGE;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, opt_text_value, parse_datetime, parse_enum};
use crate::service::WorkflowService;

const MESSAGE_COLS: &str = "id, problem_id, sender_user_id, sender_agent, content, message_type, \
     is_read, metadata, created_at, updated_at";

/// Input for [`WorkflowService::post_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub problem_id: String,
    pub sender: Sender,
    pub content: String,
    pub message_type: MessageType,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl NewMessage {
    /// An `info` message without metadata.
    #[must_use]
    pub fn new(problem_id: impl Into<String>, sender: Sender, content: impl Into<String>) -> Self {
        Self {
            problem_id: problem_id.into(),
            sender,
            content: content.into(),
            message_type: MessageType::Info,
            metadata: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub const fn of_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }
}

fn row_to_message(row: &libsql::Row) -> Result<ChatMessage, DatabaseError> {
    let sender = match (get_opt_string(row, 2)?, get_opt_string(row, 3)?) {
        (_, Some(agent)) => Sender::Agent {
            agent: parse_enum(&agent)?,
        },
        (Some(user_id), None) => Sender::User { user_id },
        (None, None) => {
            return Err(DatabaseError::Query(
                "chat message without a sender".to_string(),
            ));
        }
    };
    let metadata = match get_opt_string(row, 7)? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| DatabaseError::Query(format!("Invalid message metadata: {e}")))?,
        None => serde_json::Map::new(),
    };
    Ok(ChatMessage {
        id: row.get(0)?,
        problem_id: row.get(1)?,
        sender,
        content: row.get(4)?,
        message_type: parse_enum(&row.get::<String>(5)?)?,
        is_read: get_bool(row, 6)?,
        metadata,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl WorkflowService {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for blank content or an unknown problem.
    pub async fn post_message(&self, new: NewMessage) -> Result<ChatMessage, DatabaseError> {
        if new.content.trim().is_empty() {
            return Err(CoreError::validation("message content must not be blank").into());
        }
        if matches!(&new.sender, Sender::User { user_id } if user_id.trim().is_empty()) {
            return Err(CoreError::validation("message sender must not be blank").into());
        }
        self.require_problem(&new.problem_id).await?;

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_MESSAGE).await?;
        let (user_id, agent) = match &new.sender {
            Sender::User { user_id } => (Some(user_id.as_str()), None),
            Sender::Agent { agent } => (None, Some(agent.as_str())),
        };
        let metadata = serde_json::to_string(&new.metadata)
            .map_err(|e| DatabaseError::Query(e.to_string()))?;

        {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(
                    &format!(
                        "INSERT INTO chat_messages ({MESSAGE_COLS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9)"
                    ),
                    libsql::params![
                        id.as_str(),
                        new.problem_id.as_str(),
                        opt_text_value(user_id),
                        opt_text_value(agent),
                        new.content.as_str(),
                        new.message_type.as_str(),
                        metadata,
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )
                .await?;
        }
        tracing::debug!(message_id = %id, problem_id = %new.problem_id, sender = new.sender.label(), "message posted");

        Ok(ChatMessage {
            id,
            problem_id: new.problem_id,
            sender: new.sender,
            content: new.content,
            message_type: new.message_type,
            is_read: false,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the message does not exist.
    pub async fn get_message(&self, id: &str) -> Result<ChatMessage, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {MESSAGE_COLS} FROM chat_messages WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("chat_message", id))?;
        row_to_message(&row)
    }

    /// Messages of a problem in posting order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_messages(
        &self,
        problem_id: &str,
        unread_only: bool,
    ) -> Result<Vec<ChatMessage>, DatabaseError> {
        let filter = if unread_only { " AND is_read = 0" } else { "" };
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {MESSAGE_COLS} FROM chat_messages WHERE problem_id = ?1{filter}
                     ORDER BY created_at, rowid"
                ),
                [problem_id],
            )
            .await?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next().await? {
            messages.push(row_to_message(&row)?);
        }
        Ok(messages)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the message does not exist.
    pub async fn mark_message_read(&self, id: &str, read: bool) -> Result<ChatMessage, DatabaseError> {
        let changed = {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(
                    "UPDATE chat_messages SET is_read = ?1, updated_at = ?2 WHERE id = ?3",
                    libsql::params![i64::from(read), Utc::now().to_rfc3339(), id],
                )
                .await?
        };
        if changed == 0 {
            return Err(CoreError::not_found("chat_message", id).into());
        }
        self.get_message(id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn unread_count(&self, problem_id: &str) -> Result<u32, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM chat_messages WHERE problem_id = ?1 AND is_read = 0",
                [problem_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let count: i64 = row.get(0)?;
        u32::try_from(count).map_err(|e| DatabaseError::Query(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the message does not exist.
    pub async fn delete_message(&self, id: &str) -> Result<(), DatabaseError> {
        let deleted = {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute("DELETE FROM chat_messages WHERE id = ?1", [id])
                .await?
        };
        if deleted == 0 {
            return Err(CoreError::not_found("chat_message", id).into());
        }
        Ok(())
    }
}
