//! # dani-service
//!
//! Execution log services: recording and querying traces, aggregate
//! statistics, multi-format export, and the admin access trail.
//!
//! Services follow constructor injection: stores and collaborators are
//! provided at construction time as `Arc` handles.

pub mod audit;
pub mod context;
pub mod export;
pub mod logs;

pub use audit::AccessAuditService;
pub use context::AdminContext;
pub use export::{ExportFile, ExportFormat, ExportRequest, ExportScope, LogExportService};
pub use logs::{ExecutionLogService, FallbackWriter, LocalFallbackWriter};
