//! Degraded-mode sink for logs the database could not accept.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::info;

use dani_core::config::ExecutionLogConfig;
use dani_core::error::{AppError, ErrorKind};
use dani_core::result::AppResult;
use dani_entity::execution_log::NewExecutionLog;

/// Somewhere to put a log when the store rejects it.
#[async_trait]
pub trait FallbackWriter: Send + Sync + 'static {
    /// Persist the log and return where it went.
    async fn write(&self, log: &NewExecutionLog) -> AppResult<PathBuf>;
}

/// Writes each rejected log as a JSON file named `{user_id}_{millis}.json`.
#[derive(Debug, Clone)]
pub struct LocalFallbackWriter {
    dir: PathBuf,
}

impl LocalFallbackWriter {
    /// Create a writer rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a writer from configuration.
    pub fn from_config(config: &ExecutionLogConfig) -> Self {
        Self::new(&config.fallback_dir)
    }
}

#[async_trait]
impl FallbackWriter for LocalFallbackWriter {
    async fn write(&self, log: &NewExecutionLog) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create fallback directory {}", self.dir.display()),
                e,
            )
        })?;

        let path = self
            .dir
            .join(format!("{}_{}.json", log.user_id, Utc::now().timestamp_millis()));
        let body = serde_json::to_vec_pretty(log)?;
        fs::write(&path, body).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write fallback log {}", path.display()),
                e,
            )
        })?;

        info!(path = %path.display(), user_id = %log.user_id, "Wrote execution log to fallback");
        Ok(path)
    }
}
