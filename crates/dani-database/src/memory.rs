//! In-memory store implementations.
//!
//! Filter, sort and aggregate semantics mirror the PostgreSQL repositories
//! closely enough for service-level tests. Full-text search is approximated
//! by requiring every alphanumeric query token to appear in the text.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use dani_core::error::AppError;
use dani_core::result::AppResult;
use dani_core::types::{PageRequest, SortDirection};
use dani_entity::audit::{AdminAccessEvent, CreateAdminAccessEvent};
use dani_entity::execution_log::{
    CountBucket, Feedback, FeedbackCounts, FeedbackStatus, LogFilter, LogRecord, LogSort,
    LogSortField, LogUser, NewExecutionLog,
};

use crate::store::{AccessAuditStore, ExecutionLogStore};

/// Whether every token of `query` occurs in `text`, case-insensitively.
pub fn text_matches(text: &str, query: &str) -> bool {
    let haystack: Vec<String> = tokens(text).collect();
    tokens(query).all(|needle| haystack.contains(&needle))
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn unavailable(what: &str) -> AppError {
    AppError::database(format!("{what} store is unavailable"))
}

/// Execution log store backed by a vector.
#[derive(Debug, Default)]
pub struct MemoryExecutionLogStore {
    records: RwLock<Vec<LogRecord>>,
    unavailable: AtomicBool,
}

impl MemoryExecutionLogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a database error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Insert a fully-formed record, keeping its timestamps.
    pub async fn seed(&self, record: LogRecord) {
        self.records.write().await.push(record);
    }

    /// Snapshot of all stored records in insertion order.
    pub async fn records(&self) -> Vec<LogRecord> {
        self.records.read().await.clone()
    }

    fn check(&self) -> AppResult<()> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(unavailable("Execution log"));
        }
        Ok(())
    }

    async fn matching(&self, filter: &LogFilter) -> Vec<LogRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| filter.matches_with(r, text_matches))
            .cloned()
            .collect()
    }

    async fn sorted(&self, filter: &LogFilter, sort: &LogSort) -> Vec<LogRecord> {
        let mut records = self.matching(filter).await;
        records.sort_by(|a, b| {
            let ordering = match sort.sort_by {
                LogSortField::Timestamp => a.timestamp.cmp(&b.timestamp),
                LogSortField::ExecutionTimeMs => {
                    a.payload.execution_time_ms.cmp(&b.payload.execution_time_ms)
                }
            }
            .then_with(|| a.id.cmp(&b.id));
            match sort.sort_order {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        records
    }
}

fn ranked(counts: HashMap<String, i64>) -> Vec<CountBucket> {
    let mut buckets: Vec<CountBucket> = counts
        .into_iter()
        .map(|(key, count)| CountBucket { key, count })
        .collect();
    buckets.sort_by(|a, b| match b.count.cmp(&a.count) {
        Ordering::Equal => a.key.cmp(&b.key),
        other => other,
    });
    buckets
}

#[async_trait]
impl ExecutionLogStore for MemoryExecutionLogStore {
    async fn insert(&self, log: &NewExecutionLog) -> AppResult<Uuid> {
        self.check()?;
        let now = Utc::now();
        let record = LogRecord {
            id: Uuid::now_v7(),
            conversation_id: log.conversation_id,
            message_id: log.message_id,
            user_id: log.user_id,
            timestamp: now,
            payload: log.payload.clone(),
            created_at: now,
            updated_at: now,
        };
        let id = record.id;
        self.records.write().await.push(record);
        Ok(id)
    }

    async fn update_feedback(&self, id: Uuid, feedback: &Feedback) -> AppResult<bool> {
        self.check()?;
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.payload.feedback = feedback.clone();
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LogRecord>> {
        self.check()?;
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn find_page(
        &self,
        filter: &LogFilter,
        sort: &LogSort,
        page: &PageRequest,
    ) -> AppResult<Vec<LogRecord>> {
        self.check()?;
        Ok(self
            .sorted(filter, sort)
            .await
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .collect())
    }

    async fn find_matching(
        &self,
        filter: &LogFilter,
        sort: &LogSort,
        max_rows: u64,
    ) -> AppResult<Vec<LogRecord>> {
        self.check()?;
        let mut records = self.sorted(filter, sort).await;
        records.truncate(usize::try_from(max_rows).unwrap_or(usize::MAX));
        Ok(records)
    }

    async fn count(&self, filter: &LogFilter) -> AppResult<u64> {
        self.check()?;
        Ok(self.matching(filter).await.len() as u64)
    }

    async fn average_execution_time(&self, filter: &LogFilter) -> AppResult<f64> {
        self.check()?;
        let records = self.matching(filter).await;
        if records.is_empty() {
            return Ok(0.0);
        }
        let total: u64 = records.iter().map(|r| r.payload.execution_time_ms).sum();
        Ok(total as f64 / records.len() as f64)
    }

    async fn feedback_counts(&self, filter: &LogFilter) -> AppResult<FeedbackCounts> {
        self.check()?;
        let mut counts = FeedbackCounts::default();
        for record in self.matching(filter).await {
            match record.payload.feedback.status {
                Some(FeedbackStatus::Positive) => counts.positive += 1,
                Some(FeedbackStatus::Negative) => counts.negative += 1,
                None => counts.none += 1,
            }
        }
        Ok(counts)
    }

    async fn count_by_model(&self, filter: &LogFilter) -> AppResult<Vec<CountBucket>> {
        self.check()?;
        let mut counts = HashMap::new();
        for record in self.matching(filter).await {
            *counts.entry(record.payload.response.model_used).or_insert(0) += 1;
        }
        Ok(ranked(counts))
    }

    async fn count_by_complexity(&self, filter: &LogFilter) -> AppResult<Vec<CountBucket>> {
        self.check()?;
        let mut counts = HashMap::new();
        for record in self.matching(filter).await {
            let level = record.payload.query.analyzer_output.complexity_label();
            *counts.entry(level.to_string()).or_insert(0) += 1;
        }
        Ok(ranked(counts))
    }

    async fn top_tools(&self, filter: &LogFilter, limit: u32) -> AppResult<Vec<CountBucket>> {
        self.check()?;
        let mut counts = HashMap::new();
        for record in self.matching(filter).await {
            for name in record.payload.tool_names() {
                *counts.entry(name.to_string()).or_insert(0) += 1;
            }
        }
        let mut buckets = ranked(counts);
        buckets.truncate(limit as usize);
        Ok(buckets)
    }

    async fn distinct_users(&self) -> AppResult<Vec<LogUser>> {
        self.check()?;
        let mut users = BTreeMap::new();
        for record in self.records.read().await.iter() {
            users.entry(record.user_id).or_insert_with(|| LogUser {
                user_id: record.user_id,
                email: None,
                name: Some(record.payload.username.clone()),
            });
        }
        Ok(users.into_values().collect())
    }

    async fn distinct_tools(&self) -> AppResult<Vec<String>> {
        self.check()?;
        let records = self.records.read().await;
        let mut tools: Vec<String> = records
            .iter()
            .flat_map(|r| r.payload.tool_names().map(str::to_string))
            .collect();
        tools.sort();
        tools.dedup();
        Ok(tools)
    }
}

/// Access audit store backed by a vector.
#[derive(Debug, Default)]
pub struct MemoryAccessAuditStore {
    events: RwLock<Vec<AdminAccessEvent>>,
    unavailable: AtomicBool,
}

impl MemoryAccessAuditStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Snapshot of all recorded events.
    pub async fn events(&self) -> Vec<AdminAccessEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AccessAuditStore for MemoryAccessAuditStore {
    async fn append(&self, event: &CreateAdminAccessEvent) -> AppResult<AdminAccessEvent> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(unavailable("Access audit"));
        }
        let stored = AdminAccessEvent {
            id: Uuid::now_v7(),
            admin_user_id: event.admin_user_id,
            admin_email: event.admin_email.clone(),
            action: event.action.as_str().to_string(),
            log_id: event.log_id,
            access_context: event.access_context.clone(),
            created_at: Utc::now(),
        };
        self.events.write().await.push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use dani_entity::execution_log::{FeedbackFilter, LogPayload};

    use super::*;

    fn record(offset_min: i64, model: &str, ms: u64, tools: &[&str], text: &str) -> LogRecord {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(offset_min);
        let calls: Vec<_> = tools
            .iter()
            .map(|t| {
                json!({
                    "toolName": t, "serverName": "netops", "input": {}, "output": "ok",
                    "timestamp": ts, "duration": 10, "iteration": 1, "isError": false
                })
            })
            .collect();
        let payload: LogPayload = serde_json::from_value(json!({
            "username": "alice",
            "startTime": ts,
            "endTime": ts,
            "executionTimeMs": ms,
            "query": {
                "originalText": text,
                "analyzerOutput": { "selectedModel": model, "complexityLevel": "SIMPLE" }
            },
            "execution": { "toolCalls": calls, "reasoningSteps": [], "iterations": 1 },
            "response": { "finalText": "done", "modelUsed": model, "usage": { "inputTokens": 1, "outputTokens": 1 } }
        }))
        .unwrap();
        LogRecord {
            id: Uuid::now_v7(),
            conversation_id: None,
            message_id: None,
            user_id: Uuid::nil(),
            timestamp: ts,
            payload,
            created_at: ts,
            updated_at: ts,
        }
    }

    async fn seeded() -> MemoryExecutionLogStore {
        let store = MemoryExecutionLogStore::new();
        store.seed(record(0, "sonnet", 100, &["ping", "ping"], "Ping the core router")).await;
        store.seed(record(1, "haiku", 900, &["traceroute"], "trace route to gateway")).await;
        store.seed(record(2, "sonnet", 400, &[], "explain BGP flaps")).await;
        store
    }

    #[test]
    fn test_text_matches_requires_every_token() {
        assert!(text_matches("Ping the core router", "router ping"));
        assert!(!text_matches("Ping the core router", "router latency"));
    }

    #[tokio::test]
    async fn test_page_sorted_by_execution_time() {
        let store = seeded().await;
        let sort = LogSort {
            sort_by: LogSortField::ExecutionTimeMs,
            sort_order: SortDirection::Desc,
        };
        let page = store
            .find_page(&LogFilter::default(), &sort, &PageRequest::new(1, 2))
            .await
            .unwrap();
        let times: Vec<u64> = page.iter().map(|r| r.payload.execution_time_ms).collect();
        assert_eq!(times, vec![900, 400]);
    }

    #[tokio::test]
    async fn test_top_tools_counts_every_call() {
        let store = seeded().await;
        let top = store.top_tools(&LogFilter::default(), 10).await.unwrap();
        assert_eq!(top[0], CountBucket { key: "ping".into(), count: 2 });
        assert_eq!(top[1], CountBucket { key: "traceroute".into(), count: 1 });
        assert_eq!(
            store.distinct_tools().await.unwrap(),
            vec!["ping".to_string(), "traceroute".to_string()]
        );
    }

    #[tokio::test]
    async fn test_feedback_update_only_touches_feedback() {
        let store = seeded().await;
        let target = store.records().await[1].clone();
        let feedback = Feedback::submitted(FeedbackStatus::Negative, Some("wrong hop".into()));

        assert!(store.update_feedback(target.id, &feedback).await.unwrap());
        assert!(!store.update_feedback(Uuid::now_v7(), &feedback).await.unwrap());

        let updated = store.find_by_id(target.id).await.unwrap().unwrap();
        assert_eq!(updated.payload.feedback, feedback);
        assert_eq!(updated.payload.query, target.payload.query);
        assert_eq!(updated.timestamp, target.timestamp);

        let none = LogFilter {
            feedback_status: Some(FeedbackFilter::None),
            ..LogFilter::default()
        };
        assert_eq!(store.count(&none).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = seeded().await;
        store.set_unavailable(true);
        let err = store.count(&LogFilter::default()).await.unwrap_err();
        assert_eq!(err.kind, dani_core::error::ErrorKind::Database);
    }
}
