//! Execution log CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use dani_core::config::AppConfig;
use dani_core::error::AppError;
use dani_database::store::ExecutionLogStore;
use dani_database::{AccessAuditRepository, ExecutionLogRepository};
use dani_entity::audit::AccessAction;
use dani_entity::execution_log::{
    CountBucket, DateBound, FeedbackStatus, LogFilter, LogRecord, LogSort, LogStatistics,
};
use dani_service::{
    AccessAuditService, AdminContext, ExecutionLogService, ExportRequest, LocalFallbackWriter,
    LogExportService,
};

/// Arguments for log commands
#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Log subcommand
    #[command(subcommand)]
    pub command: LogsCommand,
}

/// Filter flags shared by list, stats and export
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Earliest timestamp (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub from: Option<String>,
    /// Latest timestamp (YYYY-MM-DD covers the whole day)
    #[arg(long)]
    pub to: Option<String>,
    /// Owning user ID
    #[arg(long)]
    pub user: Option<Uuid>,
    /// Model used for the response
    #[arg(long)]
    pub model: Option<String>,
    /// SIMPLE, PROCEDURAL or ANALYTICAL
    #[arg(long)]
    pub complexity: Option<String>,
    /// positive, negative or none
    #[arg(long)]
    pub feedback: Option<String>,
    /// Full-text search over the query text
    #[arg(short, long)]
    pub query: Option<String>,
    /// Only logs that called this tool
    #[arg(long)]
    pub tool: Option<String>,
    /// Minimum execution time in milliseconds
    #[arg(long)]
    pub min_ms: Option<i64>,
}

impl FilterArgs {
    /// Parse the flags into a log filter.
    pub fn to_filter(&self) -> Result<LogFilter, AppError> {
        Ok(LogFilter {
            date_from: self
                .from
                .as_deref()
                .map(|raw| DateBound::Start.parse(raw))
                .transpose()
                .map_err(AppError::validation)?,
            date_to: self
                .to
                .as_deref()
                .map(|raw| DateBound::End.parse(raw))
                .transpose()
                .map_err(AppError::validation)?,
            user_id: self.user,
            model: self.model.clone(),
            complexity_level: self
                .complexity
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(AppError::validation)?,
            feedback_status: self
                .feedback
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(AppError::validation)?,
            query_text: self.query.clone(),
            tool_used: self.tool.clone(),
            min_execution_time_ms: self.min_ms,
        }
        .normalized())
    }
}

/// Sort flags
#[derive(Debug, Clone, Default, Args)]
pub struct SortArgs {
    /// timestamp or executionTimeMs
    #[arg(long)]
    pub sort_by: Option<String>,
    /// ASC or DESC
    #[arg(long)]
    pub sort_order: Option<String>,
}

impl SortArgs {
    fn to_sort(&self) -> LogSort {
        LogSort::from_params(self.sort_by.as_deref(), self.sort_order.as_deref())
    }
}

/// Log subcommands
#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// List logs matching a filter
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        sort: SortArgs,
        /// Page number (1-based)
        #[arg(long)]
        page: Option<i64>,
        /// Page size (at most 1000)
        #[arg(short, long)]
        limit: Option<i64>,
    },
    /// Show one log in full
    Show {
        /// Log ID
        id: Uuid,
    },
    /// Aggregate statistics for a filter
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Users that own logs
    Users,
    /// Tools used in any log
    Tools,
    /// Export logs to a file
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        sort: SortArgs,
        /// json, csv or jsonl
        #[arg(long, default_value = "json")]
        format: String,
        /// current_page or all_filtered
        #[arg(long, default_value = "current_page")]
        scope: String,
        /// Page number for current_page exports
        #[arg(long)]
        page: Option<i64>,
        /// Page size for current_page exports
        #[arg(short, long)]
        limit: Option<i64>,
        /// Output path; defaults to the generated file name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Set feedback on a log
    Feedback {
        /// Log ID
        id: Uuid,
        /// positive or negative
        status: FeedbackStatus,
        /// Optional comment
        #[arg(long)]
        comment: Option<String>,
    },
}

/// Log display row
#[derive(Debug, Serialize, Tabled)]
struct LogRow {
    /// ID
    id: String,
    /// Time
    time: String,
    /// User
    user: String,
    /// Model
    model: String,
    /// Complexity
    complexity: String,
    /// Duration
    ms: u64,
    /// Tool calls
    tools: usize,
    /// Feedback
    feedback: String,
    /// Query
    query: String,
}

impl From<&LogRecord> for LogRow {
    fn from(record: &LogRecord) -> Self {
        let payload = &record.payload;
        Self {
            id: record.id.to_string(),
            time: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            user: payload.username.clone(),
            model: payload.response.model_used.clone(),
            complexity: payload.query.analyzer_output.complexity_label().to_string(),
            ms: payload.execution_time_ms,
            tools: payload.tool_count(),
            feedback: payload
                .feedback
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            query: output::truncate(&payload.query.original_text, 60),
        }
    }
}

/// Grouped count row
#[derive(Debug, Serialize, Tabled)]
struct CountRow {
    /// Key
    key: String,
    /// Count
    count: i64,
}

impl From<&CountBucket> for CountRow {
    fn from(bucket: &CountBucket) -> Self {
        Self {
            key: bucket.key.clone(),
            count: bucket.count,
        }
    }
}

/// User row
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    user_id: String,
    /// Email
    email: String,
    /// Name
    name: String,
}

/// Tool row
#[derive(Debug, Serialize, Tabled)]
struct ToolRow {
    /// Tool
    tool: String,
}

/// Execute log commands
pub async fn execute(
    args: &LogsArgs,
    config: &AppConfig,
    ctx: &AdminContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;
    let store: Arc<dyn ExecutionLogStore> = Arc::new(ExecutionLogRepository::new(pool.clone()));
    let audit = Arc::new(AccessAuditService::new(Arc::new(AccessAuditRepository::new(
        pool.clone(),
    ))));
    let logs = ExecutionLogService::new(
        store.clone(),
        Arc::new(LocalFallbackWriter::from_config(&config.execution_logs)),
        audit.clone(),
        &config.execution_logs,
    );

    match &args.command {
        LogsCommand::List {
            filter,
            sort,
            page,
            limit,
        } => {
            let filter = filter.to_filter()?;
            let page = logs.page_request(*page, *limit);
            let response = logs.query(&filter, &sort.to_sort(), &page).await?;
            logs.audit_access(
                ctx,
                AccessAction::ViewLogs,
                None,
                Some(json!({ "filters": filter, "page": page.page, "limit": page.limit })),
            )
            .await;

            match format {
                OutputFormat::Json => output::print_json(&response),
                OutputFormat::Table => {
                    let rows: Vec<LogRow> = response.items.iter().map(LogRow::from).collect();
                    output::print_list(&rows, format);
                    println!(
                        "Page {} of {} ({} logs)",
                        response.page, response.total_pages, response.total
                    );
                }
            }
        }
        LogsCommand::Show { id } => {
            let record = logs
                .get_detail(*id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Execution log {id} not found")))?;
            logs.audit_access(ctx, AccessAction::ViewLogDetail, Some(*id), None)
                .await;
            print_record(&record, format);
        }
        LogsCommand::Stats { filter } => {
            let filter = filter.to_filter()?;
            let stats = logs.statistics(&filter).await?;
            logs.audit_access(
                ctx,
                AccessAction::ViewStatistics,
                None,
                Some(json!({ "filters": filter.statistics_subset() })),
            )
            .await;
            print_statistics(&stats, format);
        }
        LogsCommand::Users => {
            let rows: Vec<UserRow> = logs
                .list_distinct_users()
                .await?
                .into_iter()
                .map(|u| UserRow {
                    user_id: u.user_id.to_string(),
                    email: u.email.unwrap_or_default(),
                    name: u.name.unwrap_or_default(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        LogsCommand::Tools => {
            let rows: Vec<ToolRow> = logs
                .list_distinct_tools()
                .await?
                .into_iter()
                .map(|tool| ToolRow { tool })
                .collect();
            output::print_list(&rows, format);
        }
        LogsCommand::Export {
            filter,
            sort,
            format: export_format,
            scope,
            page,
            limit,
            output: out_path,
        } => {
            let exports = LogExportService::new(store, audit.clone(), &config.execution_logs);
            let file = exports
                .export(
                    ctx,
                    ExportRequest {
                        filters: filter.to_filter()?,
                        sort: sort.to_sort(),
                        format: export_format.clone(),
                        scope: scope.clone(),
                        page: *page,
                        limit: *limit,
                    },
                )
                .await?;

            let path = out_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(&file.filename));
            tokio::fs::write(&path, file.data.as_bytes()).await?;
            output::print_success(&format!(
                "Exported {} ({}) to '{}'",
                file.filename,
                file.mime_type,
                path.display()
            ));
        }
        LogsCommand::Feedback {
            id,
            status,
            comment,
        } => {
            logs.update_feedback(*id, *status, comment.clone()).await?;
            output::print_success(&format!("Recorded {status} feedback on {id}"));
        }
    }

    audit.flush().await;
    pool.close().await;
    Ok(())
}

fn print_record(record: &LogRecord, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(record);
        return;
    }

    let payload = &record.payload;
    output::print_kv("ID", &record.id.to_string());
    output::print_kv("Timestamp", &record.timestamp.to_rfc3339());
    output::print_kv("User", &format!("{} ({})", payload.username, record.user_id));
    if let Some(conversation_id) = record.conversation_id {
        output::print_kv("Conversation", &conversation_id.to_string());
    }
    output::print_kv("Model", &payload.response.model_used);
    output::print_kv(
        "Complexity",
        payload.query.analyzer_output.complexity_label(),
    );
    output::print_kv("Execution time", &format!("{} ms", payload.execution_time_ms));
    output::print_kv(
        "Tokens",
        &format!(
            "{} in / {} out",
            payload.response.usage.input_tokens, payload.response.usage.output_tokens
        ),
    );
    output::print_kv(
        "Feedback",
        payload.feedback.status.map(|s| s.as_str()).unwrap_or("-"),
    );
    if let Some(error) = payload.error.as_ref().filter(|e| e.occurred) {
        output::print_kv("Error", error.message.as_deref().unwrap_or("unknown"));
    }

    output::print_heading("Query");
    println!("{}", payload.query.original_text);

    if !payload.execution.tool_calls.is_empty() {
        output::print_heading("Tool calls");
        for call in &payload.execution.tool_calls {
            println!(
                "  [{}] {}/{} {} ms{}",
                call.iteration,
                call.server_name,
                call.tool_name,
                call.duration,
                if call.is_error { " (error)" } else { "" }
            );
        }
    }

    output::print_heading("Response");
    println!("{}", payload.response.final_text);
}

fn print_statistics(stats: &LogStatistics, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(stats);
        return;
    }

    output::print_kv("Total logs", &stats.total_logs.to_string());
    output::print_kv(
        "Avg execution time",
        &format!("{} ms", stats.avg_execution_time_ms),
    );
    output::print_kv(
        "Feedback",
        &format!(
            "{} positive / {} negative / {} none ({}% positive)",
            stats.feedback.positive,
            stats.feedback.negative,
            stats.feedback.none,
            stats.feedback.positive_percentage
        ),
    );

    for (title, buckets) in [
        ("By model", &stats.by_model),
        ("By complexity", &stats.by_complexity),
        ("Top tools", &stats.top_tools),
    ] {
        output::print_heading(title);
        let rows: Vec<CountRow> = buckets.iter().map(CountRow::from).collect();
        output::print_list(&rows, format);
    }
}

#[cfg(test)]
mod tests {
    use dani_entity::execution_log::{ComplexityLevel, FeedbackFilter};

    use super::*;

    #[test]
    fn test_filter_flags_parse() {
        let args = FilterArgs {
            from: Some("2024-01-01".into()),
            to: Some("2024-01-31".into()),
            complexity: Some("procedural".into()),
            feedback: Some("none".into()),
            tool: Some("  ".into()),
            ..FilterArgs::default()
        };
        let filter = args.to_filter().unwrap();
        assert_eq!(filter.complexity_level, Some(ComplexityLevel::Procedural));
        assert_eq!(filter.feedback_status, Some(FeedbackFilter::None));
        assert_eq!(
            filter.date_to.map(|d| d.to_rfc3339()).as_deref(),
            Some("2024-01-31T23:59:59.999+00:00")
        );
        assert!(filter.tool_used.is_none());
    }

    #[test]
    fn test_bad_flags_are_validation_errors() {
        let args = FilterArgs {
            feedback: Some("meh".into()),
            ..FilterArgs::default()
        };
        assert!(args.to_filter().unwrap_err().is_validation());
    }
}
