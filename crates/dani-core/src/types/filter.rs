//! Filter expression types for dynamic query building.
//!
//! A filter is lowered into a flat list of [`FilterField`] conditions that
//! are AND-ed together by the renderer. The field type is generic so each
//! store can supply its own closed set of addressable columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,
    /// Language-aware full-text match (tokenized, stemmed).
    TextMatch,
    /// Document containment: the field contains the given JSON fragment.
    Contains,
    /// The field is SQL `NULL`, absent, empty, or the legacy literal string `"null"`.
    IsNullish,
}

/// A dynamic filter value that can represent the bound SQL types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A string value.
    Text(String),
    /// An integer value.
    Integer(i64),
    /// A UUID value.
    Uuid(Uuid),
    /// A timestamp value.
    Timestamp(DateTime<Utc>),
    /// A JSON document (for containment).
    Json(serde_json::Value),
    /// No value (for [`FilterOp::IsNullish`]).
    None,
}

/// A single filter condition on a field.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterField<F> {
    /// The field to filter on.
    pub field: F,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against.
    pub value: FilterValue,
}

impl<F> FilterField<F> {
    /// Create a new filter field.
    pub fn new(field: F, op: FilterOp, value: FilterValue) -> Self {
        Self { field, op, value }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: F, value: FilterValue) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Shorthand for an inclusive lower bound.
    pub fn gte(field: F, value: FilterValue) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    /// Shorthand for an inclusive upper bound.
    pub fn lte(field: F, value: FilterValue) -> Self {
        Self::new(field, FilterOp::Lte, value)
    }

    /// Shorthand for a full-text match.
    pub fn text_match(field: F, text: impl Into<String>) -> Self {
        Self::new(field, FilterOp::TextMatch, FilterValue::Text(text.into()))
    }

    /// Shorthand for a JSON containment filter.
    pub fn contains(field: F, fragment: serde_json::Value) -> Self {
        Self::new(field, FilterOp::Contains, FilterValue::Json(fragment))
    }

    /// Shorthand for a "missing or null" filter.
    pub fn is_nullish(field: F) -> Self {
        Self::new(field, FilterOp::IsNullish, FilterValue::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_nullish_takes_no_value() {
        let f = FilterField::is_nullish("status");
        assert_eq!(f.op, FilterOp::IsNullish);
        assert_eq!(f.value, FilterValue::None);
    }
}
