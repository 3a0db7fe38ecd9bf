//! Export entry point: validate, fetch, re-check, render, audit.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use dani_core::config::ExecutionLogConfig;
use dani_core::result::AppResult;
use dani_core::types::PageRequest;
use dani_database::store::ExecutionLogStore;
use dani_entity::audit::AccessAction;
use dani_entity::execution_log::{LogFilter, LogSort};

use super::format::{
    EXPORT_RECORD_LIMIT, ExportScope, check_record_limit, export_filename,
    validate_export_request,
};
use super::formatter::{ExportMetadata, render};
use crate::audit::AccessAuditService;
use crate::context::AdminContext;

/// What the caller wants exported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Filter selecting the records.
    #[serde(default)]
    pub filters: LogFilter,
    /// Ordering of the exported records.
    #[serde(default)]
    pub sort: LogSort,
    /// `json`, `csv` or `jsonl`.
    pub format: String,
    /// `current_page` or `all_filtered`.
    pub scope: String,
    /// Page for `current_page` exports.
    #[serde(default)]
    pub page: Option<i64>,
    /// Page size for `current_page` exports.
    #[serde(default)]
    pub limit: Option<i64>,
}

/// A rendered export ready for download.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    /// File contents.
    pub data: String,
    /// Suggested file name.
    pub filename: String,
    /// Content type.
    pub mime_type: String,
}

/// Execution log export service.
#[derive(Clone)]
pub struct LogExportService {
    /// Log store.
    store: Arc<dyn ExecutionLogStore>,
    /// Access audit trail.
    audit: Arc<AccessAuditService>,
    /// Page size used when a page export gives none.
    default_page_size: u64,
}

impl LogExportService {
    /// Creates a new export service.
    pub fn new(
        store: Arc<dyn ExecutionLogStore>,
        audit: Arc<AccessAuditService>,
        config: &ExecutionLogConfig,
    ) -> Self {
        Self {
            store,
            audit,
            default_page_size: config.default_page_size,
        }
    }

    /// Validates, fetches and renders an export, then records it in the
    /// access trail.
    pub async fn export(&self, ctx: &AdminContext, request: ExportRequest) -> AppResult<ExportFile> {
        let (format, scope) = validate_export_request(&request.format, &request.scope, 0)?;
        let filter = request.filters.normalized();

        let records = match scope {
            ExportScope::CurrentPage => {
                let page = PageRequest::from_raw(request.page, request.limit, self.default_page_size);
                self.store.find_page(&filter, &request.sort, &page).await?
            }
            ExportScope::AllFiltered => {
                let total = self.store.count(&filter).await?;
                check_record_limit(scope, total)?;
                let records = self
                    .store
                    .find_matching(&filter, &request.sort, EXPORT_RECORD_LIMIT + 1)
                    .await?;
                check_record_limit(scope, records.len() as u64)?;
                records
            }
        };

        let metadata = ExportMetadata {
            exported_at: Utc::now(),
            exported_by: ctx.actor_label(),
            format,
            scope,
            record_count: records.len() as u64,
            filters: filter.clone(),
        };
        let data = render(format, &metadata, &records)?;
        let filename = export_filename(format, &filter, metadata.exported_at.date_naive());

        info!(
            admin_id = %ctx.admin_id,
            format = %format,
            scope = %scope,
            records = records.len(),
            bytes = data.len(),
            "Exported execution logs"
        );

        self.audit
            .record(
                ctx,
                AccessAction::ExportLogs,
                None,
                json!({
                    "filters": filter,
                    "format": format,
                    "scope": scope,
                    "recordCount": records.len(),
                }),
            )
            .await;

        Ok(ExportFile {
            data,
            filename,
            mime_type: format.mime_type().to_string(),
        })
    }
}
