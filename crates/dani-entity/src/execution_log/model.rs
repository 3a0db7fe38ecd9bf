//! Execution log row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::payload::LogPayload;

/// One stored execution trace of a single chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Unique record identifier, generated by the store.
    pub id: Uuid,
    /// Owning conversation, once linked.
    pub conversation_id: Option<Uuid>,
    /// Assistant message this execution produced, once linked.
    pub message_id: Option<Uuid>,
    /// Owning user.
    pub user_id: Uuid,
    /// When the turn was logged; default sort and range-filter key.
    pub timestamp: DateTime<Utc>,
    /// The nested execution document.
    #[sqlx(json)]
    pub payload: LogPayload,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
    /// When the feedback was last changed (equals `created_at` until then).
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a new execution log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExecutionLog {
    /// Owning conversation, if already known.
    pub conversation_id: Option<Uuid>,
    /// Produced assistant message, if already known.
    pub message_id: Option<Uuid>,
    /// Owning user.
    pub user_id: Uuid,
    /// The execution document.
    pub payload: LogPayload,
}

/// A user that owns at least one execution log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LogUser {
    /// User identifier.
    pub user_id: Uuid,
    /// Account email, if the user still exists.
    pub email: Option<String>,
    /// Display name, if the user still exists.
    pub name: Option<String>,
}
