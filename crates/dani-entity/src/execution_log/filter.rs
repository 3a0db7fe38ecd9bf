//! The execution log filter specification.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::LogRecord;
use super::status::{ComplexityLevel, FeedbackFilter};

/// Filter over execution logs. Every field is optional; an absent field
/// places no constraint, and set fields are AND-ed together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    /// Inclusive lower bound on `timestamp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,
    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    /// Exact `response.modelUsed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Exact `query.analyzerOutput.complexityLevel`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_level: Option<ComplexityLevel>,
    /// Feedback status, or `none` for records without feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_status: Option<FeedbackFilter>,
    /// Full-text search over `query.originalText`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,
    /// Any tool call with this `toolName`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,
    /// Inclusive lower bound on `executionTimeMs`; ignored when `<= 0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_execution_time_ms: Option<i64>,
}

impl LogFilter {
    /// Drop constraints that carry no information: blank strings and
    /// non-positive execution-time bounds.
    pub fn normalized(&self) -> Self {
        Self {
            date_from: self.date_from,
            date_to: self.date_to,
            user_id: self.user_id,
            model: non_blank(&self.model),
            complexity_level: self.complexity_level,
            feedback_status: self.feedback_status,
            query_text: non_blank(&self.query_text),
            tool_used: non_blank(&self.tool_used),
            min_execution_time_ms: self.min_execution_time_ms.filter(|ms| *ms > 0),
        }
    }

    /// Keep only the fields that apply to aggregate statistics.
    ///
    /// Free-text, tool and execution-time constraints select individual
    /// traces; dashboards aggregate over date range, user, model,
    /// complexity and feedback only.
    pub fn statistics_subset(&self) -> Self {
        Self {
            date_from: self.date_from,
            date_to: self.date_to,
            user_id: self.user_id,
            model: non_blank(&self.model),
            complexity_level: self.complexity_level,
            feedback_status: self.feedback_status,
            ..Self::default()
        }
    }

    /// Evaluate the filter against an in-memory record.
    ///
    /// `text_matches` decides the full-text predicate so callers can plug in
    /// whatever tokenizer approximates the store's search configuration.
    pub fn matches_with(&self, record: &LogRecord, text_matches: impl Fn(&str, &str) -> bool) -> bool {
        let f = self.normalized();
        let payload = &record.payload;

        f.date_from.is_none_or(|from| record.timestamp >= from)
            && f.date_to.is_none_or(|to| record.timestamp <= to)
            && f.user_id.is_none_or(|id| record.user_id == id)
            && f.model.as_deref().is_none_or(|m| payload.response.model_used == m)
            && f.complexity_level
                .is_none_or(|c| payload.query.analyzer_output.complexity_level == Some(c))
            && f.feedback_status
                .is_none_or(|fb| fb.matches(payload.feedback.status))
            && f.query_text
                .as_deref()
                .is_none_or(|q| text_matches(&payload.query.original_text, q))
            && f.tool_used.as_deref().is_none_or(|t| payload.used_tool(t))
            && f.min_execution_time_ms
                .is_none_or(|ms| payload.execution_time_ms as i64 >= ms)
    }
}

/// Which end of a date range a bare date is parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// Start of the day.
    Start,
    /// Last millisecond of the day, so `dateTo=2024-01-31` includes the 31st.
    End,
}

impl DateBound {
    /// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
    pub fn parse(&self, raw: &str) -> Result<DateTime<Utc>, String> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date '{raw}'. Use YYYY-MM-DD or RFC 3339"))?;
        let time = match self {
            Self::Start => NaiveTime::MIN,
            Self::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
                .ok_or_else(|| "invalid end-of-day time".to_string())?,
        };
        Ok(Utc.from_utc_datetime(&date.and_time(time)))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_normalize_away() {
        let filter = LogFilter {
            model: Some("   ".into()),
            query_text: Some(String::new()),
            min_execution_time_ms: Some(0),
            ..LogFilter::default()
        };
        assert_eq!(filter.normalized(), LogFilter::default());

        let with_tool = LogFilter {
            tool_used: Some(" ping ".into()),
            ..LogFilter::default()
        };
        assert_eq!(with_tool.normalized().tool_used.as_deref(), Some("ping"));
    }

    #[test]
    fn test_statistics_subset_drops_trace_level_fields() {
        let filter = LogFilter {
            model: Some("claude-sonnet".into()),
            query_text: Some("latency".into()),
            tool_used: Some("ping".into()),
            min_execution_time_ms: Some(500),
            ..LogFilter::default()
        };
        let subset = filter.statistics_subset();
        assert_eq!(subset.model.as_deref(), Some("claude-sonnet"));
        assert!(subset.query_text.is_none());
        assert!(subset.tool_used.is_none());
        assert!(subset.min_execution_time_ms.is_none());
    }

    #[test]
    fn test_bare_end_date_covers_whole_day() {
        let end = DateBound::End.parse("2024-01-31").expect("date");
        assert_eq!(end.to_rfc3339(), "2024-01-31T23:59:59.999+00:00");
        let start = DateBound::Start.parse("2024-01-01").expect("date");
        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(DateBound::Start.parse("yesterday").is_err());
    }

    #[test]
    fn test_serialized_filter_omits_unset_fields() {
        let filter = LogFilter {
            tool_used: Some("ping".into()),
            ..LogFilter::default()
        };
        let value = serde_json::to_value(&filter).expect("serialize");
        assert_eq!(value, serde_json::json!({ "toolUsed": "ping" }));
    }
}
