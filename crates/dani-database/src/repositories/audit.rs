//! Admin access audit repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use dani_core::error::{AppError, ErrorKind};
use dani_core::result::AppResult;
use dani_entity::audit::{AdminAccessEvent, CreateAdminAccessEvent};

use crate::store::AccessAuditStore;

/// Repository for the `admin_access_logs` table.
#[derive(Debug, Clone)]
pub struct AccessAuditRepository {
    pool: PgPool,
}

impl AccessAuditRepository {
    /// Create a new access audit repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessAuditStore for AccessAuditRepository {
    async fn append(&self, event: &CreateAdminAccessEvent) -> AppResult<AdminAccessEvent> {
        sqlx::query_as::<_, AdminAccessEvent>(
            r#"INSERT INTO admin_access_logs (admin_user_id, admin_email, action, log_id, access_context)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, admin_user_id, admin_email, action, log_id, access_context, created_at"#,
        )
        .bind(event.admin_user_id)
        .bind(&event.admin_email)
        .bind(event.action.as_str())
        .bind(event.log_id)
        .bind(&event.access_context)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record admin access", e)
        })
    }
}
