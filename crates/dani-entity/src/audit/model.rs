//! Admin access audit entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What an administrator did with the execution logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    /// Listed or searched logs.
    ViewLogs,
    /// Opened a single log.
    ViewLogDetail,
    /// Viewed aggregate statistics.
    ViewStatistics,
    /// Downloaded an export.
    ExportLogs,
}

impl AccessAction {
    /// Return the action tag stored in the audit table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewLogs => "view_logs",
            Self::ViewLogDetail => "view_log_detail",
            Self::ViewStatistics => "view_statistics",
            Self::ExportLogs => "export_logs",
        }
    }
}

impl fmt::Display for AccessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable record of an administrator reading or exporting logs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccessEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// The administrator who acted.
    pub admin_user_id: Uuid,
    /// The administrator's email at the time of access.
    pub admin_email: Option<String>,
    /// Action tag, see [`AccessAction::as_str`].
    pub action: String,
    /// The log that was accessed, for single-record actions.
    pub log_id: Option<Uuid>,
    /// Free-form context such as the applied filter.
    pub access_context: serde_json::Value,
    /// When the access happened.
    pub created_at: DateTime<Utc>,
}

/// Data required to append an access event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminAccessEvent {
    /// The administrator who acted.
    pub admin_user_id: Uuid,
    /// The administrator's email.
    pub admin_email: Option<String>,
    /// What was done.
    pub action: AccessAction,
    /// Target log, if any.
    pub log_id: Option<Uuid>,
    /// Free-form context.
    pub access_context: serde_json::Value,
}
