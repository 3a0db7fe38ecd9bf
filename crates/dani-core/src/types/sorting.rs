//! Sorting types for list endpoints.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Desc
    }
}

impl SortDirection {
    /// Return the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parse a caller-supplied direction, falling back to the default
    /// (`DESC`) for anything unrecognised instead of rejecting it.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("ASC") => Self::Asc,
            Some("DESC") => Self::Desc,
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(SortDirection::parse_or_default(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse_or_default(Some(" DESC ")), SortDirection::Desc);
    }

    #[test]
    fn test_invalid_direction_falls_back() {
        assert_eq!(SortDirection::parse_or_default(Some("sideways")), SortDirection::Desc);
        assert_eq!(SortDirection::parse_or_default(None), SortDirection::Desc);
    }
}
