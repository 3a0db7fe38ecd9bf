//! The nested execution payload stored in the `payload` JSONB column.
//!
//! Field names are part of the durable contract: filters, statistics and
//! exports address them by JSON path (`query.originalText`,
//! `response.modelUsed`, `execution.toolCalls[].toolName`,
//! `feedback.status`, ...). Renaming a field here breaks every stored row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::status::{ComplexityLevel, FeedbackStatus};

/// Current payload schema version written by this crate.
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

/// One execution trace of a chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPayload {
    /// Payload schema version; rows written before versioning read as 1.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Denormalized display name of the owning user.
    pub username: String,
    /// When the agent started working on the turn.
    pub start_time: DateTime<Utc>,
    /// When the agent produced its final response.
    pub end_time: DateTime<Utc>,
    /// `end_time - start_time` in milliseconds, computed by the producer.
    pub execution_time_ms: u64,
    /// The user's query and its analysis.
    pub query: QueryInfo,
    /// Tool calls and reasoning steps.
    #[serde(default)]
    pub execution: ExecutionTrace,
    /// The final response and token usage.
    pub response: ResponseInfo,
    /// User feedback; the only part mutable after insertion.
    #[serde(default)]
    pub feedback: Feedback,
    /// Error details if the turn failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionError>,
    /// Open-ended extension bag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl LogPayload {
    /// Names of all tools invoked, in call order (duplicates kept).
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.execution.tool_calls.iter().map(|c| c.tool_name.as_str())
    }

    /// Whether any tool call used the given tool.
    pub fn used_tool(&self, name: &str) -> bool {
        self.tool_names().any(|t| t == name)
    }

    /// Number of tool calls made.
    pub fn tool_count(&self) -> usize {
        self.execution.tool_calls.len()
    }
}

/// The user's query and the analyzer's classification of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfo {
    /// The raw query text; full-text searchable.
    pub original_text: String,
    /// Upstream analyzer output.
    pub analyzer_output: AnalyzerOutput,
}

/// Output of the query analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerOutput {
    /// Model chosen for the turn.
    pub selected_model: String,
    /// Complexity classification; `None` when missing or unrecognized.
    #[serde(
        default,
        deserialize_with = "ComplexityLevel::deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub complexity_level: Option<ComplexityLevel>,
    /// Free-text justification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl AnalyzerOutput {
    /// The level as stored, or `"unknown"`; matches the statistics grouping.
    pub fn complexity_label(&self) -> &'static str {
        self.complexity_level
            .as_ref()
            .map_or(ComplexityLevel::UNKNOWN, ComplexityLevel::as_str)
    }
}

/// What the agent did while producing the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTrace {
    /// Every tool invocation, in order. A missing or non-array value reads
    /// as no calls.
    #[serde(default, deserialize_with = "tool_calls_lenient")]
    pub tool_calls: Vec<ToolCall>,
    /// Every deliberation step, in order.
    #[serde(default)]
    pub reasoning_steps: Vec<ReasoningStep>,
    /// Number of agent loop iterations.
    #[serde(default)]
    pub iterations: u32,
}

/// One invocation of an external tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Tool name, e.g. `"ping"`.
    pub tool_name: String,
    /// Server that hosts the tool.
    pub server_name: String,
    /// Arguments passed to the tool.
    #[serde(default)]
    pub input: serde_json::Value,
    /// Tool result; may itself be an error string.
    #[serde(default)]
    pub output: serde_json::Value,
    /// When the call was issued.
    pub timestamp: DateTime<Utc>,
    /// Call duration in milliseconds.
    #[serde(default)]
    pub duration: u64,
    /// Agent loop iteration the call belongs to.
    #[serde(default)]
    pub iteration: u32,
    /// Whether the tool reported an error.
    #[serde(default)]
    pub is_error: bool,
}

/// One iteration of the agent's deliberation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningStep {
    /// Agent loop iteration.
    pub iteration: u32,
    /// When the step happened.
    pub timestamp: DateTime<Utc>,
    /// Tools the model asked for in this step.
    #[serde(default)]
    pub tools_requested: Vec<String>,
    /// Optional "thinking" content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_content: Option<String>,
    /// Ordinal position within the trace.
    pub position: u32,
}

/// The final answer and what it cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    /// Final response text shown to the user.
    pub final_text: String,
    /// Model that produced the response.
    pub model_used: String,
    /// Token accounting.
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Token accounting for a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens.
    pub input_tokens: u64,
    /// Completion tokens.
    pub output_tokens: u64,
    /// Tokens written to the prompt cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_tokens: Option<u64>,
    /// Tokens served from the prompt cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
}

/// User feedback on a response.
///
/// Always written as a unit: a new submission replaces status, comment and
/// timestamp together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// `null` until the user reacts.
    #[serde(default, deserialize_with = "FeedbackStatus::deserialize_lenient")]
    pub status: Option<FeedbackStatus>,
    /// Optional comment attached to the reaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the feedback was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Feedback {
    /// A fresh submission stamped with the current time.
    pub fn submitted(status: FeedbackStatus, comment: Option<String>) -> Self {
        Self {
            status: Some(status),
            comment,
            timestamp: Some(Utc::now()),
        }
    }
}

/// Error details of a failed turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Whether an error occurred.
    pub occurred: bool,
    /// Error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Stack trace or backtrace text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

fn default_schema_version() -> u32 {
    PAYLOAD_SCHEMA_VERSION
}

fn tool_calls_lenient<'de, D>(deserializer: D) -> Result<Vec<ToolCall>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        calls @ serde_json::Value::Array(_) => {
            serde_json::from_value(calls).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}
