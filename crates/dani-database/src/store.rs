//! Storage seams for execution logs and admin access events.
//!
//! Services hold these as `Arc<dyn ...>` so the PostgreSQL repositories can
//! be swapped for the in-memory stores in tests.

use async_trait::async_trait;
use uuid::Uuid;

use dani_core::result::AppResult;
use dani_core::types::PageRequest;
use dani_entity::audit::{AdminAccessEvent, CreateAdminAccessEvent};
use dani_entity::execution_log::{
    CountBucket, Feedback, FeedbackCounts, LogFilter, LogRecord, LogSort, LogUser,
    NewExecutionLog,
};

/// Persistence and query operations over execution logs.
#[async_trait]
pub trait ExecutionLogStore: Send + Sync + 'static {
    /// Insert a new log and return its generated id.
    async fn insert(&self, log: &NewExecutionLog) -> AppResult<Uuid>;

    /// Replace the `feedback` sub-document only. Returns `false` when no
    /// log has the id.
    async fn update_feedback(&self, id: Uuid, feedback: &Feedback) -> AppResult<bool>;

    /// Fetch one log.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LogRecord>>;

    /// One sorted page of matching logs.
    async fn find_page(
        &self,
        filter: &LogFilter,
        sort: &LogSort,
        page: &PageRequest,
    ) -> AppResult<Vec<LogRecord>>;

    /// Up to `max_rows` matching logs, bypassing the page-size ceiling.
    async fn find_matching(
        &self,
        filter: &LogFilter,
        sort: &LogSort,
        max_rows: u64,
    ) -> AppResult<Vec<LogRecord>>;

    /// Number of matching logs.
    async fn count(&self, filter: &LogFilter) -> AppResult<u64>;

    /// Mean execution time of matching logs, `0.0` when none match.
    async fn average_execution_time(&self, filter: &LogFilter) -> AppResult<f64>;

    /// Feedback histogram of matching logs.
    async fn feedback_counts(&self, filter: &LogFilter) -> AppResult<FeedbackCounts>;

    /// Counts per model, descending.
    async fn count_by_model(&self, filter: &LogFilter) -> AppResult<Vec<CountBucket>>;

    /// Counts per complexity level, descending.
    async fn count_by_complexity(&self, filter: &LogFilter) -> AppResult<Vec<CountBucket>>;

    /// Most used tools across matching logs, descending, at most `limit`.
    async fn top_tools(&self, filter: &LogFilter, limit: u32) -> AppResult<Vec<CountBucket>>;

    /// Users that own at least one log.
    async fn distinct_users(&self) -> AppResult<Vec<LogUser>>;

    /// Tool names used in any log, ascending.
    async fn distinct_tools(&self) -> AppResult<Vec<String>>;
}

/// Append-only admin access trail.
#[async_trait]
pub trait AccessAuditStore: Send + Sync + 'static {
    /// Record one access event.
    async fn append(&self, event: &CreateAdminAccessEvent) -> AppResult<AdminAccessEvent>;
}
