//! Execution log repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use dani_core::error::{AppError, ErrorKind};
use dani_core::result::AppResult;
use dani_core::types::PageRequest;
use dani_entity::execution_log::{
    CountBucket, Feedback, FeedbackCounts, LogFilter, LogRecord, LogSort, LogUser,
    NewExecutionLog,
};

use crate::query::LogQuery;
use crate::query::builder::{SELECT_DISTINCT_TOOLS, SELECT_DISTINCT_USERS, SELECT_LOG_BY_ID};
use crate::store::ExecutionLogStore;

/// Repository for the `execution_logs` table.
#[derive(Debug, Clone)]
pub struct ExecutionLogRepository {
    pool: PgPool,
}

impl ExecutionLogRepository {
    /// Create a new execution log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

#[async_trait]
impl ExecutionLogStore for ExecutionLogRepository {
    async fn insert(&self, log: &NewExecutionLog) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO execution_logs (conversation_id, message_id, user_id, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING id"#,
        )
        .bind(log.conversation_id)
        .bind(log.message_id)
        .bind(log.user_id)
        .bind(Json(&log.payload))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to insert execution log"))
    }

    async fn update_feedback(&self, id: Uuid, feedback: &Feedback) -> AppResult<bool> {
        let result = sqlx::query(
            r#"UPDATE execution_logs
            SET payload = jsonb_set(payload, '{feedback}', $2, true), updated_at = NOW()
            WHERE id = $1"#,
        )
        .bind(id)
        .bind(Json(feedback))
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update execution log feedback"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LogRecord>> {
        sqlx::query_as::<_, LogRecord>(SELECT_LOG_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find execution log"))
    }

    async fn find_page(
        &self,
        filter: &LogFilter,
        sort: &LogSort,
        page: &PageRequest,
    ) -> AppResult<Vec<LogRecord>> {
        let mut qb = LogQuery::new(filter).select_page(sort, page);
        debug!(sql = %qb.sql(), "Listing execution logs");
        qb.build_query_as::<LogRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list execution logs"))
    }

    async fn find_matching(
        &self,
        filter: &LogFilter,
        sort: &LogSort,
        max_rows: u64,
    ) -> AppResult<Vec<LogRecord>> {
        let mut qb = LogQuery::new(filter).select_matching(sort, max_rows);
        qb.build_query_as::<LogRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to fetch execution logs"))
    }

    async fn count(&self, filter: &LogFilter) -> AppResult<u64> {
        let mut qb = LogQuery::new(filter).count();
        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count execution logs"))?;
        Ok(count.max(0) as u64)
    }

    async fn average_execution_time(&self, filter: &LogFilter) -> AppResult<f64> {
        let mut qb = LogQuery::new(filter).average_execution_time();
        qb.build_query_scalar::<f64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to compute average execution time"))
    }

    async fn feedback_counts(&self, filter: &LogFilter) -> AppResult<FeedbackCounts> {
        let mut qb = LogQuery::new(filter).feedback_counts();
        let (positive, negative, none) = qb
            .build_query_as::<(i64, i64, i64)>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count feedback"))?;
        Ok(FeedbackCounts {
            positive: positive.max(0) as u64,
            negative: negative.max(0) as u64,
            none: none.max(0) as u64,
        })
    }

    async fn count_by_model(&self, filter: &LogFilter) -> AppResult<Vec<CountBucket>> {
        let mut qb = LogQuery::new(filter).count_by_model();
        qb.build_query_as::<CountBucket>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to count logs by model"))
    }

    async fn count_by_complexity(&self, filter: &LogFilter) -> AppResult<Vec<CountBucket>> {
        let mut qb = LogQuery::new(filter).count_by_complexity();
        qb.build_query_as::<CountBucket>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to count logs by complexity"))
    }

    async fn top_tools(&self, filter: &LogFilter, limit: u32) -> AppResult<Vec<CountBucket>> {
        let mut qb = LogQuery::new(filter).top_tools(limit);
        qb.build_query_as::<CountBucket>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to rank tools"))
    }

    async fn distinct_users(&self) -> AppResult<Vec<LogUser>> {
        sqlx::query_as::<_, LogUser>(SELECT_DISTINCT_USERS)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list log users"))
    }

    async fn distinct_tools(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(SELECT_DISTINCT_TOOLS)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list tools"))
    }
}
