//! Best-effort recording of admin reads and exports.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use dani_database::store::AccessAuditStore;
use dani_entity::audit::{AccessAction, CreateAdminAccessEvent};

use crate::context::AdminContext;

/// Append-only access audit service.
///
/// Appends run on background tasks so a slow audit store never delays the
/// read or export being audited. Call [`flush`](Self::flush) before
/// shutting the store down.
#[derive(Clone)]
pub struct AccessAuditService {
    /// Audit store.
    store: Arc<dyn AccessAuditStore>,
    /// Appends still in flight.
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl AccessAuditService {
    /// Creates a new access audit service.
    pub fn new(store: Arc<dyn AccessAuditStore>) -> Self {
        Self {
            store,
            pending: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Records one access event without waiting for the store.
    ///
    /// Never fails: a store error is logged and the audited operation
    /// carries on.
    pub async fn record(
        &self,
        ctx: &AdminContext,
        action: AccessAction,
        log_id: Option<Uuid>,
        access_context: serde_json::Value,
    ) {
        let event = CreateAdminAccessEvent {
            admin_user_id: ctx.admin_id,
            admin_email: ctx.email.clone(),
            action,
            log_id,
            access_context,
        };
        let store = self.store.clone();
        let admin_id = ctx.admin_id;

        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            match store.append(&event).await {
                Ok(stored) => {
                    debug!(event_id = %stored.id, action = %action, admin_id = %admin_id, "Recorded admin access");
                }
                Err(e) => {
                    warn!(error = %e, action = %action, admin_id = %admin_id, "Failed to record admin access");
                }
            }
        });
    }

    /// Wait for every in-flight append to finish.
    pub async fn flush(&self) {
        let mut pending = self.pending.lock().await;
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Access audit task did not complete");
            }
        }
    }
}
