//! Execution log recording, querying and statistics.

pub mod fallback;
pub mod service;

pub use fallback::{FallbackWriter, LocalFallbackWriter};
pub use service::ExecutionLogService;
