//! Export formats, scopes and request validation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use dani_core::error::AppError;
use dani_core::result::AppResult;
use dani_entity::execution_log::LogFilter;

/// Maximum number of records a single `all_filtered` export may contain.
pub const EXPORT_RECORD_LIMIT: u64 = 10_000;

/// Export serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One pretty-printed JSON document.
    Json,
    /// Flattened CSV with a `#` metadata block.
    Csv,
    /// Newline-delimited JSON.
    Jsonl,
}

impl ExportFormat {
    /// Return the format as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
        }
    }

    /// File extension.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// MIME type of the rendered file.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
            Self::Jsonl => "application/x-ndjson",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "jsonl" => Ok(Self::Jsonl),
            _ => Err(AppError::validation(format!(
                "Invalid export format '{s}'. Must be one of: json, csv, jsonl"
            ))),
        }
    }
}

/// Which records an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    /// The page the caller is looking at.
    CurrentPage,
    /// Every record matching the filter, up to [`EXPORT_RECORD_LIMIT`].
    AllFiltered,
}

impl ExportScope {
    /// Return the scope as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentPage => "current_page",
            Self::AllFiltered => "all_filtered",
        }
    }
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExportScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current_page" => Ok(Self::CurrentPage),
            "all_filtered" => Ok(Self::AllFiltered),
            _ => Err(AppError::validation(format!(
                "Invalid export scope '{s}'. Must be one of: current_page, all_filtered"
            ))),
        }
    }
}

/// Validate an export request before (and after) fetching records.
pub fn validate_export_request(
    format: &str,
    scope: &str,
    record_count: u64,
) -> AppResult<(ExportFormat, ExportScope)> {
    let format: ExportFormat = format.parse()?;
    let scope: ExportScope = scope.parse()?;
    check_record_limit(scope, record_count)?;
    Ok((format, scope))
}

/// Reject `all_filtered` exports larger than [`EXPORT_RECORD_LIMIT`].
pub fn check_record_limit(scope: ExportScope, record_count: u64) -> AppResult<()> {
    if scope == ExportScope::AllFiltered && record_count > EXPORT_RECORD_LIMIT {
        return Err(AppError::validation(format!(
            "Export exceeds the maximum of {EXPORT_RECORD_LIMIT} records ({record_count} match). \
             Narrow the filters and try again"
        )));
    }
    Ok(())
}

/// Download name derived from the date range of the filter and `today`.
pub fn export_filename(format: ExportFormat, filter: &LogFilter, today: NaiveDate) -> String {
    let day = |ts: chrono::DateTime<chrono::Utc>| ts.date_naive().format("%Y-%m-%d").to_string();
    let range = match (filter.date_from, filter.date_to) {
        (Some(from), Some(to)) => format!("{}_to_{}", day(from), day(to)),
        (Some(from), None) => format!("from-{}", day(from)),
        (None, Some(to)) => format!("until-{}", day(to)),
        (None, None) => "all".to_string(),
    };
    format!(
        "dani-execution-logs_{range}_{}.{}",
        today.format("%Y-%m-%d"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_rejects_unknown_format() {
        let err = validate_export_request("xml", "current_page", 10).unwrap_err();
        assert!(err.is_validation());
        assert!(err.message.contains("Invalid export format 'xml'"));
    }

    #[test]
    fn test_rejects_unknown_scope() {
        let err = validate_export_request("csv", "everything", 10).unwrap_err();
        assert!(err.message.contains("Invalid export scope"));
    }

    #[test]
    fn test_record_limit_applies_to_all_filtered_only() {
        let err = validate_export_request("json", "all_filtered", 10_001).unwrap_err();
        assert!(err.is_validation());
        assert!(err.message.contains("10001"));

        assert!(validate_export_request("json", "all_filtered", 10_000).is_ok());
        assert!(validate_export_request("json", "current_page", 10_001).is_ok());
    }

    #[test]
    fn test_filename_reflects_date_range() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let from = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 59).unwrap();

        let both = LogFilter {
            date_from: Some(from),
            date_to: Some(to),
            ..LogFilter::default()
        };
        assert_eq!(
            export_filename(ExportFormat::Csv, &both, today),
            "dani-execution-logs_2024-06-01_to_2024-06-10_2024-06-15.csv"
        );

        let open_end = LogFilter {
            date_from: Some(from),
            ..LogFilter::default()
        };
        assert_eq!(
            export_filename(ExportFormat::Jsonl, &open_end, today),
            "dani-execution-logs_from-2024-06-01_2024-06-15.jsonl"
        );

        assert_eq!(
            export_filename(ExportFormat::Json, &LogFilter::default(), today),
            "dani-execution-logs_all_2024-06-15.json"
        );
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ExportFormat::Json.mime_type(), "application/json");
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv");
        assert_eq!(ExportFormat::Jsonl.mime_type(), "application/x-ndjson");
    }
}
