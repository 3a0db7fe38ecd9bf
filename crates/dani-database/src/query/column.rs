//! Addressable execution log columns and filter lowering.

use serde_json::json;

use dani_core::types::{FilterField, FilterValue};
use dani_entity::execution_log::{FeedbackFilter, LogFilter, LogSortField};

/// A column or JSON path that predicates and orderings may reference.
///
/// Every variant maps to a fixed SQL expression over the `execution_logs l`
/// alias, so no identifier in a generated statement comes from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogColumn {
    /// `timestamp` column.
    Timestamp,
    /// `user_id` column.
    UserId,
    /// `payload.response.modelUsed`.
    ModelUsed,
    /// `payload.query.analyzerOutput.complexityLevel`.
    ComplexityLevel,
    /// `payload.feedback.status`.
    FeedbackStatus,
    /// `payload.query.originalText`.
    OriginalText,
    /// `payload.execution.toolCalls` as JSONB.
    ToolCalls,
    /// `payload.executionTimeMs` as `bigint`.
    ExecutionTimeMs,
}

impl LogColumn {
    /// SQL expression for this column.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Timestamp => r#"l."timestamp""#,
            Self::UserId => "l.user_id",
            Self::ModelUsed => "l.payload->'response'->>'modelUsed'",
            Self::ComplexityLevel => "l.payload->'query'->'analyzerOutput'->>'complexityLevel'",
            Self::FeedbackStatus => "l.payload->'feedback'->>'status'",
            Self::OriginalText => "l.payload->'query'->>'originalText'",
            Self::ToolCalls => "l.payload->'execution'->'toolCalls'",
            Self::ExecutionTimeMs => "(l.payload->>'executionTimeMs')::bigint",
        }
    }
}

impl From<LogSortField> for LogColumn {
    fn from(field: LogSortField) -> Self {
        match field {
            LogSortField::Timestamp => Self::Timestamp,
            LogSortField::ExecutionTimeMs => Self::ExecutionTimeMs,
        }
    }
}

/// Lower a [`LogFilter`] into AND-ed predicates, in a stable order.
pub fn log_predicates(filter: &LogFilter) -> Vec<FilterField<LogColumn>> {
    let f = filter.normalized();
    let mut predicates = Vec::new();

    if let Some(from) = f.date_from {
        predicates.push(FilterField::gte(LogColumn::Timestamp, FilterValue::Timestamp(from)));
    }
    if let Some(to) = f.date_to {
        predicates.push(FilterField::lte(LogColumn::Timestamp, FilterValue::Timestamp(to)));
    }
    if let Some(user_id) = f.user_id {
        predicates.push(FilterField::eq(LogColumn::UserId, FilterValue::Uuid(user_id)));
    }
    if let Some(model) = f.model {
        predicates.push(FilterField::eq(LogColumn::ModelUsed, FilterValue::Text(model)));
    }
    if let Some(level) = f.complexity_level {
        predicates.push(FilterField::eq(
            LogColumn::ComplexityLevel,
            FilterValue::Text(level.as_str().to_string()),
        ));
    }
    match f.feedback_status {
        Some(FeedbackFilter::None) => {
            predicates.push(FilterField::is_nullish(LogColumn::FeedbackStatus));
        }
        Some(other) => {
            predicates.push(FilterField::eq(
                LogColumn::FeedbackStatus,
                FilterValue::Text(other.as_str().to_string()),
            ));
        }
        None => {}
    }
    if let Some(text) = f.query_text {
        predicates.push(FilterField::text_match(LogColumn::OriginalText, text));
    }
    if let Some(tool) = f.tool_used {
        predicates.push(FilterField::contains(
            LogColumn::ToolCalls,
            json!([{ "toolName": tool }]),
        ));
    }
    if let Some(ms) = f.min_execution_time_ms {
        predicates.push(FilterField::gte(LogColumn::ExecutionTimeMs, FilterValue::Integer(ms)));
    }

    predicates
}

#[cfg(test)]
mod tests {
    use dani_core::types::FilterOp;
    use dani_entity::execution_log::ComplexityLevel;

    use super::*;

    #[test]
    fn test_empty_filter_has_no_predicates() {
        assert!(log_predicates(&LogFilter::default()).is_empty());
    }

    #[test]
    fn test_feedback_none_lowers_to_nullish() {
        let filter = LogFilter {
            feedback_status: Some(FeedbackFilter::None),
            ..LogFilter::default()
        };
        let predicates = log_predicates(&filter);
        assert_eq!(predicates, vec![FilterField::is_nullish(LogColumn::FeedbackStatus)]);
    }

    #[test]
    fn test_tool_filter_lowers_to_containment() {
        let filter = LogFilter {
            tool_used: Some("ping".into()),
            complexity_level: Some(ComplexityLevel::Simple),
            min_execution_time_ms: Some(-1),
            ..LogFilter::default()
        };
        let predicates = log_predicates(&filter);
        assert_eq!(predicates.len(), 2);
        assert_eq!(predicates[0].value, FilterValue::Text("SIMPLE".into()));
        assert_eq!(predicates[1].op, FilterOp::Contains);
        assert_eq!(
            predicates[1].value,
            FilterValue::Json(json!([{ "toolName": "ping" }]))
        );
    }
}
