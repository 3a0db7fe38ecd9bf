//! Execution log export: validation, rendering and download naming.

pub mod format;
pub mod formatter;
pub mod service;

pub use format::{
    EXPORT_RECORD_LIMIT, ExportFormat, ExportScope, export_filename, validate_export_request,
};
pub use formatter::{ExportMetadata, render};
pub use service::{ExportFile, ExportRequest, LogExportService};
