//! Execution log domain models.

pub mod filter;
pub mod model;
pub mod payload;
pub mod sort;
pub mod stats;
pub mod status;

pub use filter::{DateBound, LogFilter};
pub use model::{LogRecord, LogUser, NewExecutionLog};
pub use payload::{
    AnalyzerOutput, ExecutionError, ExecutionTrace, Feedback, LogPayload, QueryInfo,
    ReasoningStep, ResponseInfo, TokenUsage, ToolCall,
};
pub use sort::{LogSort, LogSortField};
pub use stats::{CountBucket, FeedbackBreakdown, FeedbackCounts, LogStatistics, TOP_TOOLS_LIMIT};
pub use status::{ComplexityLevel, FeedbackFilter, FeedbackStatus};
