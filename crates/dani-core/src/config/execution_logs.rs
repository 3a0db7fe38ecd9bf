//! Execution log query and export configuration.

use serde::{Deserialize, Serialize};

/// Settings for the execution log subsystem.
///
/// The hard page-size ceiling (1000) and the export record cap (10,000)
/// are not configurable; see [`crate::types::pagination::MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogConfig {
    /// Page size used when the caller does not supply one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Directory receiving payloads that could not be written to the database.
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: String,
}

impl Default for ExecutionLogConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            fallback_dir: default_fallback_dir(),
        }
    }
}

fn default_page_size() -> u64 {
    50
}

fn default_fallback_dir() -> String {
    "./data/failed-logs".to_string()
}
