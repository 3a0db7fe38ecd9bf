//! Aggregate statistics over execution logs.

use serde::{Deserialize, Serialize};

/// Number of top tools reported in statistics.
pub const TOP_TOOLS_LIMIT: u32 = 10;

/// A grouped count, e.g. logs per model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CountBucket {
    /// Group key; `"unknown"` when the path is missing.
    pub key: String,
    /// Number of occurrences.
    pub count: i64,
}

/// Feedback histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackCounts {
    /// Logs with positive feedback.
    pub positive: u64,
    /// Logs with negative feedback.
    pub negative: u64,
    /// Logs without feedback.
    pub none: u64,
}

impl FeedbackCounts {
    /// Share of positive feedback among logs that have any, rounded to a
    /// whole percent. Zero when nobody left feedback.
    pub fn positive_percentage(&self) -> u32 {
        let rated = self.positive + self.negative;
        if rated == 0 {
            return 0;
        }
        (self.positive as f64 / rated as f64 * 100.0).round() as u32
    }
}

/// Feedback histogram plus the derived percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBreakdown {
    /// Logs with positive feedback.
    pub positive: u64,
    /// Logs with negative feedback.
    pub negative: u64,
    /// Logs without feedback.
    pub none: u64,
    /// `round(positive / (positive + negative) * 100)`.
    pub positive_percentage: u32,
}

impl From<FeedbackCounts> for FeedbackBreakdown {
    fn from(counts: FeedbackCounts) -> Self {
        Self {
            positive: counts.positive,
            negative: counts.negative,
            none: counts.none,
            positive_percentage: counts.positive_percentage(),
        }
    }
}

/// Everything the statistics dashboard shows for a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStatistics {
    /// Number of matching logs.
    pub total_logs: u64,
    /// Mean `executionTimeMs`, rounded to whole milliseconds.
    pub avg_execution_time_ms: u64,
    /// Feedback histogram.
    pub feedback: FeedbackBreakdown,
    /// Logs per `response.modelUsed`, most frequent first.
    pub by_model: Vec<CountBucket>,
    /// Logs per complexity level, most frequent first.
    pub by_complexity: Vec<CountBucket>,
    /// Most used tools across all tool calls, most frequent first.
    pub top_tools: Vec<CountBucket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_ignores_unrated_logs() {
        let counts = FeedbackCounts {
            positive: 3,
            negative: 1,
            none: 6,
        };
        assert_eq!(counts.positive_percentage(), 75);
        assert_eq!(FeedbackBreakdown::from(counts).none, 6);
    }

    #[test]
    fn test_percentage_zero_without_feedback() {
        let counts = FeedbackCounts {
            positive: 0,
            negative: 0,
            none: 12,
        };
        assert_eq!(counts.positive_percentage(), 0);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let counts = FeedbackCounts {
            positive: 1,
            negative: 7,
            none: 0,
        };
        // 12.5 -> 13
        assert_eq!(counts.positive_percentage(), 13);
    }
}
