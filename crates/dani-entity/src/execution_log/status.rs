//! Feedback status and complexity level enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// User feedback on an execution.
///
/// There is no "cleared" variant: once a record has feedback it can only
/// be overwritten by a newer positive or negative submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    /// Thumbs up.
    Positive,
    /// Thumbs down.
    Negative,
}

impl FeedbackStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }

    /// Deserialize an optional status, reading the legacy literal string
    /// `"null"` and the empty string written by older producers as
    /// "no feedback".
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Self>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("null") | Some("") => Ok(None),
            Some(other) => other.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FeedbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            other => Err(format!(
                "Invalid feedback status '{other}'. Must be 'positive' or 'negative'"
            )),
        }
    }
}

/// Feedback filter: a concrete status, or records without any feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackFilter {
    /// Only positive feedback.
    Positive,
    /// Only negative feedback.
    Negative,
    /// Feedback status missing, JSON `null`, `""`, or the legacy string `"null"`.
    None,
}

impl FeedbackFilter {
    /// Return the filter as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::None => "none",
        }
    }

    /// The concrete status this filter selects, if any.
    pub fn status(&self) -> Option<FeedbackStatus> {
        match self {
            Self::Positive => Some(FeedbackStatus::Positive),
            Self::Negative => Some(FeedbackStatus::Negative),
            Self::None => None,
        }
    }

    /// Whether a record with the given status passes this filter.
    pub fn matches(&self, status: Option<FeedbackStatus>) -> bool {
        self.status() == status
    }
}

impl FromStr for FeedbackFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "none" => Ok(Self::None),
            other => Err(format!(
                "Invalid feedback filter '{other}'. Must be one of: positive, negative, none"
            )),
        }
    }
}

/// Coarse query classification assigned by the upstream analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplexityLevel {
    /// Single-step lookups.
    Simple,
    /// Multi-step, tool-driven procedures.
    Procedural,
    /// Open-ended analysis.
    Analytical,
}

impl ComplexityLevel {
    /// Label for records whose level is missing or unrecognized.
    pub const UNKNOWN: &'static str = "unknown";

    /// Deserialize an optional level; missing, `null` and unrecognized
    /// values all read as `None` so older rows still decode.
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Self>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| s.parse().ok()))
    }

    /// Return the level as stored in the payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Procedural => "PROCEDURAL",
            Self::Analytical => "ANALYTICAL",
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComplexityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(Self::Simple),
            "PROCEDURAL" => Ok(Self::Procedural),
            "ANALYTICAL" => Ok(Self::Analytical),
            other => Err(format!(
                "Invalid complexity level '{other}'. Must be one of: SIMPLE, PROCEDURAL, ANALYTICAL"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_round_trips_as_screaming_case() {
        let json = serde_json::to_string(&ComplexityLevel::Procedural).expect("serialize");
        assert_eq!(json, "\"PROCEDURAL\"");
        assert_eq!("analytical".parse::<ComplexityLevel>(), Ok(ComplexityLevel::Analytical));
    }

    #[test]
    fn test_unrecognized_complexity_reads_as_none() {
        #[derive(Deserialize)]
        struct Levelled {
            #[serde(default, deserialize_with = "ComplexityLevel::deserialize_lenient")]
            level: Option<ComplexityLevel>,
        }
        let parse = |raw: &str| serde_json::from_str::<Levelled>(raw).expect("decode").level;
        assert_eq!(parse(r#"{"level":"SIMPLE"}"#), Some(ComplexityLevel::Simple));
        assert_eq!(parse(r#"{"level":"MODERATE"}"#), None);
        assert_eq!(parse(r#"{"level":null}"#), None);
        assert_eq!(parse("{}"), None);
    }

    #[test]
    fn test_feedback_filter_none_matches_missing_status() {
        assert!(FeedbackFilter::None.matches(None));
        assert!(!FeedbackFilter::None.matches(Some(FeedbackStatus::Positive)));
        assert!(FeedbackFilter::Negative.matches(Some(FeedbackStatus::Negative)));
    }

    #[test]
    fn test_feedback_status_rejects_unknown() {
        assert!("meh".parse::<FeedbackStatus>().is_err());
        assert_eq!("Positive".parse::<FeedbackStatus>(), Ok(FeedbackStatus::Positive));
    }
}
