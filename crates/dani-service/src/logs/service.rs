//! Execution log service: record, query, detail, feedback and statistics.

use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use dani_core::config::ExecutionLogConfig;
use dani_core::error::AppError;
use dani_core::result::AppResult;
use dani_core::types::{PageRequest, PageResponse};
use dani_database::store::ExecutionLogStore;
use dani_entity::audit::AccessAction;
use dani_entity::execution_log::{
    Feedback, FeedbackStatus, LogFilter, LogRecord, LogSort, LogStatistics, LogUser,
    NewExecutionLog, TOP_TOOLS_LIMIT,
};

use super::fallback::FallbackWriter;
use crate::audit::AccessAuditService;
use crate::context::AdminContext;

/// Execution log service.
#[derive(Clone)]
pub struct ExecutionLogService {
    /// Log store.
    store: Arc<dyn ExecutionLogStore>,
    /// Sink for logs the store rejected.
    fallback: Arc<dyn FallbackWriter>,
    /// Access audit trail.
    audit: Arc<AccessAuditService>,
    /// Page size used when the caller gives none.
    default_page_size: u64,
}

impl ExecutionLogService {
    /// Creates a new execution log service.
    pub fn new(
        store: Arc<dyn ExecutionLogStore>,
        fallback: Arc<dyn FallbackWriter>,
        audit: Arc<AccessAuditService>,
        config: &ExecutionLogConfig,
    ) -> Self {
        Self {
            store,
            fallback,
            audit,
            default_page_size: config.default_page_size,
        }
    }

    /// Sanitize raw pagination input with the configured default page size.
    pub fn page_request(&self, page: Option<i64>, limit: Option<i64>) -> PageRequest {
        PageRequest::from_raw(page, limit, self.default_page_size)
    }

    /// Stores one execution trace.
    ///
    /// Returns the new id, or `None` when the store failed and the trace
    /// went to the fallback sink instead. Never fails the chat turn.
    pub async fn record(&self, log: NewExecutionLog) -> Option<Uuid> {
        match self.store.insert(&log).await {
            Ok(id) => {
                debug!(log_id = %id, user_id = %log.user_id, "Recorded execution log");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, user_id = %log.user_id, "Failed to store execution log, using fallback");
                if let Err(fallback_err) = self.fallback.write(&log).await {
                    error!(
                        error = %fallback_err,
                        user_id = %log.user_id,
                        "Execution log lost: fallback write failed"
                    );
                }
                None
            }
        }
    }

    /// Replaces the feedback of one log with a fresh submission.
    pub async fn update_feedback(
        &self,
        id: Uuid,
        status: FeedbackStatus,
        comment: Option<String>,
    ) -> AppResult<()> {
        let feedback = Feedback::submitted(status, comment);
        if !self.store.update_feedback(id, &feedback).await? {
            return Err(AppError::not_found(format!("Execution log {id} not found")));
        }
        debug!(log_id = %id, status = %status, "Updated execution log feedback");
        Ok(())
    }

    /// Lists one page of logs matching the filter.
    ///
    /// The data and count statements run concurrently; either failing
    /// fails the request.
    pub async fn query(
        &self,
        filter: &LogFilter,
        sort: &LogSort,
        page: &PageRequest,
    ) -> AppResult<PageResponse<LogRecord>> {
        let filter = filter.normalized();
        let (items, total) = tokio::try_join!(
            self.store.find_page(&filter, sort, page),
            self.store.count(&filter),
        )?;

        debug!(total, page = page.page, limit = page.limit, "Queried execution logs");
        Ok(PageResponse::new(items, page, total))
    }

    /// Fetches one log, if it exists.
    pub async fn get_detail(&self, id: Uuid) -> AppResult<Option<LogRecord>> {
        self.store.find_by_id(id).await
    }

    /// Aggregate statistics over the date, user, model, complexity and
    /// feedback constraints of the filter.
    pub async fn statistics(&self, filter: &LogFilter) -> AppResult<LogStatistics> {
        let filter = filter.statistics_subset();
        let (total, average, feedback, by_model, by_complexity, top_tools) = tokio::try_join!(
            self.store.count(&filter),
            self.store.average_execution_time(&filter),
            self.store.feedback_counts(&filter),
            self.store.count_by_model(&filter),
            self.store.count_by_complexity(&filter),
            self.store.top_tools(&filter, TOP_TOOLS_LIMIT),
        )?;

        Ok(LogStatistics {
            total_logs: total,
            avg_execution_time_ms: average.max(0.0).round() as u64,
            feedback: feedback.into(),
            by_model,
            by_complexity,
            top_tools,
        })
    }

    /// Users that own at least one log.
    pub async fn list_distinct_users(&self) -> AppResult<Vec<LogUser>> {
        self.store.distinct_users().await
    }

    /// Every tool name used in any log, sorted.
    pub async fn list_distinct_tools(&self) -> AppResult<Vec<String>> {
        self.store.distinct_tools().await
    }

    /// Records an admin read in the access trail. Best effort.
    pub async fn audit_access(
        &self,
        ctx: &AdminContext,
        action: AccessAction,
        log_id: Option<Uuid>,
        access_context: Option<serde_json::Value>,
    ) {
        let access_context = access_context.unwrap_or_else(|| serde_json::json!({}));
        self.audit.record(ctx, action, log_id, access_context).await;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;
    use tokio::sync::Mutex;

    use dani_database::{MemoryAccessAuditStore, MemoryExecutionLogStore};
    use dani_entity::execution_log::{FeedbackFilter, LogPayload};

    use super::*;
    use crate::logs::LocalFallbackWriter;

    #[derive(Default)]
    struct RecordingFallback {
        written: Mutex<Vec<NewExecutionLog>>,
    }

    #[async_trait]
    impl FallbackWriter for RecordingFallback {
        async fn write(&self, log: &NewExecutionLog) -> AppResult<PathBuf> {
            self.written.lock().await.push(log.clone());
            Ok(PathBuf::from("memory"))
        }
    }

    fn payload(model: &str, ms: u64, tools: &[&str], status: Option<&str>) -> LogPayload {
        let calls: Vec<_> = tools
            .iter()
            .map(|t| {
                json!({
                    "toolName": t, "serverName": "netops", "input": {}, "output": "ok",
                    "timestamp": "2024-03-01T12:00:00Z", "duration": 3, "iteration": 1, "isError": false
                })
            })
            .collect();
        serde_json::from_value(json!({
            "username": "alice",
            "startTime": "2024-03-01T12:00:00Z",
            "endTime": "2024-03-01T12:00:01Z",
            "executionTimeMs": ms,
            "query": {
                "originalText": "check the uplink",
                "analyzerOutput": { "selectedModel": model, "complexityLevel": "SIMPLE" }
            },
            "execution": { "toolCalls": calls, "reasoningSteps": [], "iterations": 1 },
            "response": { "finalText": "ok", "modelUsed": model, "usage": { "inputTokens": 1, "outputTokens": 1 } },
            "feedback": { "status": status }
        }))
        .unwrap()
    }

    async fn seed(store: &MemoryExecutionLogStore, minute: i64, payload: LogPayload) -> Uuid {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minute);
        let id = Uuid::now_v7();
        store
            .seed(LogRecord {
                id,
                conversation_id: None,
                message_id: None,
                user_id: Uuid::nil(),
                timestamp: ts,
                payload,
                created_at: ts,
                updated_at: ts,
            })
            .await;
        id
    }

    fn service_with(
        store: Arc<MemoryExecutionLogStore>,
        fallback: Arc<dyn FallbackWriter>,
    ) -> ExecutionLogService {
        let audit = Arc::new(AccessAuditService::new(Arc::new(MemoryAccessAuditStore::new())));
        ExecutionLogService::new(store, fallback, audit, &ExecutionLogConfig::default())
    }

    #[tokio::test]
    async fn test_empty_filter_returns_everything_newest_first() {
        let store = Arc::new(MemoryExecutionLogStore::new());
        let first = seed(&store, 0, payload("sonnet", 100, &[], None)).await;
        let second = seed(&store, 5, payload("haiku", 200, &[], None)).await;
        let service = service_with(store, Arc::new(RecordingFallback::default()));

        let page = service
            .query(&LogFilter::default(), &LogSort::default(), &PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 1);
        let ids: Vec<Uuid> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn test_none_feedback_filter_excludes_rated_logs() {
        let store = Arc::new(MemoryExecutionLogStore::new());
        seed(&store, 0, payload("sonnet", 100, &[], Some("positive"))).await;
        seed(&store, 1, payload("sonnet", 100, &[], Some("negative"))).await;
        let legacy = seed(&store, 2, payload("sonnet", 100, &[], Some("null"))).await;
        let unset = seed(&store, 3, payload("sonnet", 100, &[], None)).await;
        let service = service_with(store, Arc::new(RecordingFallback::default()));

        let filter = LogFilter {
            feedback_status: Some(FeedbackFilter::None),
            ..LogFilter::default()
        };
        let page = service
            .query(&filter, &LogSort::default(), &PageRequest::default())
            .await
            .unwrap();

        let ids: Vec<Uuid> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![unset, legacy]);
        assert!(page.items.iter().all(|r| r.payload.feedback.status.is_none()));
    }

    #[tokio::test]
    async fn test_out_of_range_pagination_is_clamped() {
        let store = Arc::new(MemoryExecutionLogStore::new());
        for minute in 0..3 {
            seed(&store, minute, payload("sonnet", 100, &[], None)).await;
        }
        let service = service_with(store, Arc::new(RecordingFallback::default()));

        let page = service.page_request(Some(-5), Some(5000));
        assert_eq!(page, PageRequest::new(1, 1000));
        let response = service
            .query(&LogFilter::default(), &LogSort::default(), &page)
            .await
            .unwrap();
        assert_eq!(response.page, 1);
        assert_eq!(response.items.len(), 3);

        assert_eq!(service.page_request(None, None).limit, 50);
    }

    #[tokio::test]
    async fn test_detail_is_idempotent_and_missing_is_none() {
        let store = Arc::new(MemoryExecutionLogStore::new());
        let id = seed(&store, 0, payload("sonnet", 100, &["ping"], None)).await;
        let service = service_with(store, Arc::new(RecordingFallback::default()));

        let first = service.get_detail(id).await.unwrap();
        let second = service.get_detail(id).await.unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
        assert!(service.get_detail(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_feedback_last_write_wins() {
        let store = Arc::new(MemoryExecutionLogStore::new());
        let id = seed(&store, 0, payload("sonnet", 100, &[], None)).await;
        let service = service_with(store, Arc::new(RecordingFallback::default()));

        let before = Utc::now();
        service
            .update_feedback(id, FeedbackStatus::Positive, Some("great".into()))
            .await
            .unwrap();

        let first = service.get_detail(id).await.unwrap().unwrap();
        let first_stamp = first.payload.feedback.timestamp.expect("feedback timestamp");
        assert_eq!(first.payload.feedback.status, Some(FeedbackStatus::Positive));
        assert_eq!(first.payload.feedback.comment.as_deref(), Some("great"));
        assert!(first_stamp >= before);
        assert!(first.updated_at > first.created_at);

        service
            .update_feedback(id, FeedbackStatus::Negative, None)
            .await
            .unwrap();

        let record = service.get_detail(id).await.unwrap().unwrap();
        assert_eq!(record.payload.feedback.status, Some(FeedbackStatus::Negative));
        assert_eq!(record.payload.feedback.comment, None);
        assert!(record.payload.feedback.timestamp.expect("feedback timestamp") >= first_stamp);
        assert!(record.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_feedback_on_missing_log_is_not_found() {
        let store = Arc::new(MemoryExecutionLogStore::new());
        let service = service_with(store, Arc::new(RecordingFallback::default()));

        let err = service
            .update_feedback(Uuid::now_v7(), FeedbackStatus::Positive, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_statistics_aggregate_and_rank() {
        let store = Arc::new(MemoryExecutionLogStore::new());
        for minute in 0..3 {
            seed(&store, minute, payload("sonnet", 100, &["ping"], Some("positive"))).await;
        }
        seed(&store, 3, payload("haiku", 500, &["traceroute", "ping"], Some("negative"))).await;
        for minute in 4..10 {
            seed(&store, minute, payload("sonnet", 100, &[], None)).await;
        }
        let service = service_with(store, Arc::new(RecordingFallback::default()));

        let filter = LogFilter {
            tool_used: Some("does-not-apply".into()),
            ..LogFilter::default()
        };
        let stats = service.statistics(&filter).await.unwrap();

        assert_eq!(stats.total_logs, 10);
        assert_eq!(stats.avg_execution_time_ms, 140);
        assert_eq!(stats.feedback.positive_percentage, 75);
        assert_eq!(stats.feedback.none, 6);
        assert_eq!(stats.by_model[0].key, "sonnet");
        assert_eq!(stats.by_model[0].count, 9);
        assert_eq!(stats.top_tools[0].key, "ping");
        assert_eq!(stats.top_tools[0].count, 4);
        assert_eq!(
            service.list_distinct_tools().await.unwrap(),
            vec!["ping".to_string(), "traceroute".to_string()]
        );
    }

    #[tokio::test]
    async fn test_statistics_fail_fast_when_store_down() {
        let store = Arc::new(MemoryExecutionLogStore::new());
        seed(&store, 0, payload("sonnet", 100, &[], None)).await;
        store.set_unavailable(true);
        let service = service_with(store, Arc::new(RecordingFallback::default()));

        assert!(service.statistics(&LogFilter::default()).await.is_err());
        assert!(
            service
                .query(&LogFilter::default(), &LogSort::default(), &PageRequest::default())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_record_degrades_to_fallback() {
        let store = Arc::new(MemoryExecutionLogStore::new());
        let fallback = Arc::new(RecordingFallback::default());
        let service = service_with(store.clone(), fallback.clone());
        let log = NewExecutionLog {
            conversation_id: None,
            message_id: None,
            user_id: Uuid::now_v7(),
            payload: payload("sonnet", 100, &[], None),
        };

        assert!(service.record(log.clone()).await.is_some());
        assert!(fallback.written.lock().await.is_empty());

        store.set_unavailable(true);
        assert!(service.record(log.clone()).await.is_none());
        let written = fallback.written.lock().await;
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].user_id, log.user_id);
    }

    #[tokio::test]
    async fn test_local_fallback_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LocalFallbackWriter::new(dir.path().join("failed-logs"));
        let log = NewExecutionLog {
            conversation_id: None,
            message_id: None,
            user_id: Uuid::nil(),
            payload: payload("sonnet", 100, &["ping"], None),
        };

        let path = writer.write(&log).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(&format!("{}_", Uuid::nil())));
        assert!(name.ends_with(".json"));

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let restored: NewExecutionLog = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored.payload, log.payload);
    }
}
