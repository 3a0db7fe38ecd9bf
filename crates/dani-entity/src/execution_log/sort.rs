//! Sort specification for execution log listings.

use serde::{Deserialize, Serialize};

use dani_core::types::SortDirection;

/// Sortable execution log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogSortField {
    /// Log timestamp.
    #[default]
    Timestamp,
    /// `payload.executionTimeMs`.
    ExecutionTimeMs,
}

impl LogSortField {
    /// Parse a caller-supplied field name; unknown names fall back to
    /// [`LogSortField::Timestamp`] rather than failing the request.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("executionTimeMs") | Some("execution_time_ms") => Self::ExecutionTimeMs,
            _ => Self::Timestamp,
        }
    }
}

/// Field plus direction. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSort {
    /// Field to sort by.
    pub sort_by: LogSortField,
    /// Direction.
    pub sort_order: SortDirection,
}

impl LogSort {
    /// Build from raw `sortBy` / `sortOrder` parameters, permissively.
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        Self {
            sort_by: LogSortField::parse_or_default(sort_by),
            sort_order: SortDirection::parse_or_default(sort_order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_newest_first() {
        let sort = LogSort::default();
        assert_eq!(sort.sort_by, LogSortField::Timestamp);
        assert_eq!(sort.sort_order, SortDirection::Desc);
    }

    #[test]
    fn test_invalid_params_fall_back() {
        let sort = LogSort::from_params(Some("DROP TABLE"), Some("up"));
        assert_eq!(sort, LogSort::default());

        let sort = LogSort::from_params(Some("executionTimeMs"), Some("asc"));
        assert_eq!(sort.sort_by, LogSortField::ExecutionTimeMs);
        assert_eq!(sort.sort_order, SortDirection::Asc);
    }
}
