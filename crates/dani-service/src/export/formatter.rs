//! Rendering of execution logs into JSON, CSV and JSONL documents.

use chrono::{DateTime, Utc};
use csv::{Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dani_core::error::{AppError, ErrorKind};
use dani_core::result::AppResult;
use dani_entity::execution_log::{LogFilter, LogPayload, LogRecord};

use super::format::{ExportFormat, ExportScope};

/// Characters of the final response kept in the CSV preview column.
const PREVIEW_CHARS: usize = 200;

/// Describes an export; leads every rendered file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    /// When the export was produced.
    pub exported_at: DateTime<Utc>,
    /// Admin email or id.
    pub exported_by: String,
    /// Output format.
    pub format: ExportFormat,
    /// Page or full filter.
    pub scope: ExportScope,
    /// Number of records in the file.
    pub record_count: u64,
    /// The applied filter.
    pub filters: LogFilter,
}

/// A record with its payload fields lifted to the top level.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportEntry<'a> {
    id: Uuid,
    conversation_id: Option<Uuid>,
    message_id: Option<Uuid>,
    user_id: Uuid,
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    payload: &'a LogPayload,
}

impl<'a> From<&'a LogRecord> for ExportEntry<'a> {
    fn from(record: &'a LogRecord) -> Self {
        Self {
            id: record.id,
            conversation_id: record.conversation_id,
            message_id: record.message_id,
            user_id: record.user_id,
            timestamp: record.timestamp,
            payload: &record.payload,
        }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    metadata: &'a ExportMetadata,
    logs: Vec<ExportEntry<'a>>,
}

#[derive(Serialize)]
struct JsonlHeader<'a> {
    #[serde(rename = "_metadata")]
    metadata: &'a ExportMetadata,
}

/// One CSV line; field order is the column order.
#[derive(Serialize)]
struct CsvRow<'a> {
    id: Uuid,
    timestamp: String,
    user_id: Uuid,
    username: &'a str,
    query: &'a str,
    model: &'a str,
    complexity: &'static str,
    execution_time_ms: u64,
    tool_count: usize,
    response_preview: String,
    feedback: &'static str,
    full_data_json: String,
}

impl<'a> CsvRow<'a> {
    fn new(record: &'a LogRecord) -> AppResult<Self> {
        let payload = &record.payload;
        Ok(Self {
            id: record.id,
            timestamp: record.timestamp.to_rfc3339(),
            user_id: record.user_id,
            username: &payload.username,
            query: &payload.query.original_text,
            model: &payload.response.model_used,
            complexity: payload.query.analyzer_output.complexity_label(),
            execution_time_ms: payload.execution_time_ms,
            tool_count: payload.tool_count(),
            response_preview: preview(&payload.response.final_text),
            feedback: payload.feedback.status.map(|s| s.as_str()).unwrap_or(""),
            full_data_json: serde_json::to_string(payload)?,
        })
    }
}

/// Render `records` in `format`, preceded by `metadata`.
pub fn render(
    format: ExportFormat,
    metadata: &ExportMetadata,
    records: &[LogRecord],
) -> AppResult<String> {
    match format {
        ExportFormat::Json => render_json(metadata, records),
        ExportFormat::Csv => render_csv(metadata, records),
        ExportFormat::Jsonl => render_jsonl(metadata, records),
    }
}

fn render_json(metadata: &ExportMetadata, records: &[LogRecord]) -> AppResult<String> {
    let document = JsonDocument {
        metadata,
        logs: records.iter().map(ExportEntry::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

fn render_jsonl(metadata: &ExportMetadata, records: &[LogRecord]) -> AppResult<String> {
    let mut out = serde_json::to_string(&JsonlHeader { metadata })?;
    out.push('\n');
    for record in records {
        out.push_str(&serde_json::to_string(&ExportEntry::from(record))?);
        out.push('\n');
    }
    Ok(out)
}

fn render_csv(metadata: &ExportMetadata, records: &[LogRecord]) -> AppResult<String> {
    let mut out = String::new();
    out.push_str("# DANI Execution Logs Export\n");
    out.push_str(&format!("# Exported At: {}\n", metadata.exported_at.to_rfc3339()));
    out.push_str(&format!("# Exported By: {}\n", metadata.exported_by));
    out.push_str(&format!("# Format: {}\n", metadata.format));
    out.push_str(&format!("# Scope: {}\n", metadata.scope));
    out.push_str(&format!("# Record Count: {}\n", metadata.record_count));
    out.push_str(&format!("# Filters: {}\n", serde_json::to_string(&metadata.filters)?));

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if records.is_empty() {
        writer.write_record(CSV_HEADER)?;
    }
    for record in records {
        writer.serialize(CsvRow::new(record)?)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("Failed to finish CSV export: {e}")))?;
    let body = String::from_utf8(bytes).map_err(|e| {
        AppError::with_source(ErrorKind::Serialization, "CSV export is not valid UTF-8", e)
    })?;

    out.push_str(&body);
    Ok(out)
}

/// Header written when there are no rows to derive it from.
const CSV_HEADER: [&str; 12] = [
    "id",
    "timestamp",
    "user_id",
    "username",
    "query",
    "model",
    "complexity",
    "execution_time_ms",
    "tool_count",
    "response_preview",
    "feedback",
    "full_data_json",
];

fn preview(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
