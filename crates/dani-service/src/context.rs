//! Identity of the administrator performing a log operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for the current administrative request.
///
/// Supplied by the caller (HTTP middleware, CLI flags) and trusted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminContext {
    /// The administrator's user ID.
    pub admin_id: Uuid,
    /// The administrator's email, if known.
    pub email: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl AdminContext {
    /// Creates a new admin context.
    pub fn new(admin_id: Uuid, email: Option<String>) -> Self {
        Self {
            admin_id,
            email,
            request_time: Utc::now(),
        }
    }

    /// Email if present, otherwise the user ID.
    pub fn actor_label(&self) -> String {
        match &self.email {
            Some(email) => email.clone(),
            None => self.admin_id.to_string(),
        }
    }
}
