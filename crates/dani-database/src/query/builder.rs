//! Parameterized statement builder for execution log queries.

use sqlx::{Postgres, QueryBuilder};

use dani_core::types::{FilterField, FilterOp, FilterValue, PageRequest};
use dani_entity::execution_log::{LogFilter, LogSort};

use super::column::{LogColumn, log_predicates};

/// Columns selected for a full [`LogRecord`](dani_entity::execution_log::LogRecord).
pub const LOG_COLUMNS: &str = r#"l.id, l.conversation_id, l.message_id, l.user_id, l."timestamp", l.payload, l.created_at, l.updated_at"#;

/// Fetch one log by id.
pub const SELECT_LOG_BY_ID: &str = r#"SELECT l.id, l.conversation_id, l.message_id, l.user_id, l."timestamp", l.payload, l.created_at, l.updated_at FROM execution_logs l WHERE l.id = $1"#;

/// Every user owning at least one log, joined with account details if present.
pub const SELECT_DISTINCT_USERS: &str = "SELECT DISTINCT l.user_id, u.email, u.name \
     FROM execution_logs l LEFT JOIN users u ON u.id = l.user_id \
     ORDER BY u.email NULLS LAST, l.user_id";

/// Every tool name that appears in any log, ascending.
pub const SELECT_DISTINCT_TOOLS: &str = "SELECT DISTINCT tc->>'toolName' AS tool_name \
     FROM execution_logs l \
     CROSS JOIN LATERAL jsonb_array_elements(CASE WHEN jsonb_typeof(l.payload->'execution'->'toolCalls') = 'array' \
     THEN l.payload->'execution'->'toolCalls' ELSE '[]'::jsonb END) AS tc \
     WHERE tc->>'toolName' IS NOT NULL \
     ORDER BY tool_name";

/// Unnests tool calls; rows whose `toolCalls` is missing or not an array
/// contribute nothing.
const TOOL_CALL_JOIN: &str = " CROSS JOIN LATERAL jsonb_array_elements(CASE WHEN jsonb_typeof(l.payload->'execution'->'toolCalls') = 'array' \
     THEN l.payload->'execution'->'toolCalls' ELSE '[]'::jsonb END) AS tc";

/// A filter lowered once and rendered into any of the log statements.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    predicates: Vec<FilterField<LogColumn>>,
}

impl LogQuery {
    /// Lower the filter.
    pub fn new(filter: &LogFilter) -> Self {
        Self {
            predicates: log_predicates(filter),
        }
    }

    /// One page of full records, ordered by the sort with `l.id` as the
    /// tie-breaker so pages never overlap.
    pub fn select_page(&self, sort: &LogSort, page: &PageRequest) -> QueryBuilder<'static, Postgres> {
        let mut qb = self.base(LOG_COLUMNS, "");
        push_order(&mut qb, sort);
        qb.push(" LIMIT ");
        qb.push_bind(page.limit() as i64);
        qb.push(" OFFSET ");
        qb.push_bind(page.sql_offset());
        qb
    }

    /// Every matching record up to `max_rows`, ignoring page-size limits.
    pub fn select_matching(&self, sort: &LogSort, max_rows: u64) -> QueryBuilder<'static, Postgres> {
        let mut qb = self.base(LOG_COLUMNS, "");
        push_order(&mut qb, sort);
        qb.push(" LIMIT ");
        qb.push_bind(max_rows.min(i64::MAX as u64) as i64);
        qb
    }

    /// `COUNT(*)` over matching records.
    pub fn count(&self) -> QueryBuilder<'static, Postgres> {
        self.base("COUNT(*)", "")
    }

    /// Mean `executionTimeMs`, `0` when nothing matches.
    pub fn average_execution_time(&self) -> QueryBuilder<'static, Postgres> {
        let select = format!("COALESCE(AVG({}), 0)::float8", LogColumn::ExecutionTimeMs.as_sql());
        self.base(&select, "")
    }

    /// Positive / negative / none counts in one pass.
    pub fn feedback_counts(&self) -> QueryBuilder<'static, Postgres> {
        let status = LogColumn::FeedbackStatus.as_sql();
        let select = format!(
            "COUNT(*) FILTER (WHERE {status} = 'positive') AS positive, \
             COUNT(*) FILTER (WHERE {status} = 'negative') AS negative, \
             COUNT(*) FILTER (WHERE {status} IS NULL OR {status} IN ('null', '')) AS \"none\""
        );
        self.base(&select, "")
    }

    /// Record counts per `response.modelUsed`.
    pub fn count_by_model(&self) -> QueryBuilder<'static, Postgres> {
        self.grouped(LogColumn::ModelUsed)
    }

    /// Record counts per complexity level.
    pub fn count_by_complexity(&self) -> QueryBuilder<'static, Postgres> {
        self.grouped(LogColumn::ComplexityLevel)
    }

    /// The `limit` most frequent tool names across matching records,
    /// counting every call.
    pub fn top_tools(&self, limit: u32) -> QueryBuilder<'static, Postgres> {
        let mut qb = self.base("tc->>'toolName' AS key, COUNT(*) AS count", TOOL_CALL_JOIN);
        qb.push(" AND tc->>'toolName' IS NOT NULL");
        qb.push(" GROUP BY 1 ORDER BY count DESC, key ASC LIMIT ");
        qb.push_bind(i64::from(limit));
        qb
    }

    fn grouped(&self, column: LogColumn) -> QueryBuilder<'static, Postgres> {
        let select = format!("COALESCE({}, 'unknown') AS key, COUNT(*) AS count", column.as_sql());
        let mut qb = self.base(&select, "");
        qb.push(" GROUP BY 1 ORDER BY count DESC, key ASC");
        qb
    }

    fn base(&self, select: &str, joins: &str) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {select} FROM execution_logs l{joins}"));
        self.push_where(&mut qb);
        qb
    }

    /// Append `WHERE TRUE AND ...` for every predicate.
    pub fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" WHERE TRUE");
        for predicate in &self.predicates {
            push_predicate(qb, predicate);
        }
    }
}

fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, predicate: &FilterField<LogColumn>) {
    let column = predicate.field.as_sql();
    match predicate.op {
        FilterOp::Eq => {
            qb.push(format!(" AND {column} = "));
            push_value(qb, &predicate.value);
        }
        FilterOp::Gte => {
            qb.push(format!(" AND {column} >= "));
            push_value(qb, &predicate.value);
        }
        FilterOp::Lte => {
            qb.push(format!(" AND {column} <= "));
            push_value(qb, &predicate.value);
        }
        FilterOp::TextMatch => {
            qb.push(format!(
                " AND to_tsvector('english', COALESCE({column}, '')) @@ plainto_tsquery('english', "
            ));
            push_value(qb, &predicate.value);
            qb.push(")");
        }
        FilterOp::Contains => {
            qb.push(format!(" AND {column} @> "));
            push_value(qb, &predicate.value);
        }
        FilterOp::IsNullish => {
            qb.push(format!(" AND ({column} IS NULL OR {column} IN ('null', ''))"));
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(text) => qb.push_bind(text.clone()),
        FilterValue::Integer(n) => qb.push_bind(*n),
        FilterValue::Uuid(id) => qb.push_bind(*id),
        FilterValue::Timestamp(ts) => qb.push_bind(*ts),
        FilterValue::Json(doc) => qb.push_bind(doc.clone()),
        FilterValue::None => qb.push("NULL"),
    };
}

fn push_order(qb: &mut QueryBuilder<'static, Postgres>, sort: &LogSort) {
    let direction = sort.sort_order.as_sql();
    let column = LogColumn::from(sort.sort_by).as_sql();
    qb.push(format!(" ORDER BY {column} {direction}, l.id {direction}"));
}
