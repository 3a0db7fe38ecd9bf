//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod database;
pub mod execution_logs;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::execution_logs::ExecutionLogConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (base file + environment overlay + `DANI__*`
/// environment variables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Execution log query and export settings.
    #[serde(default)]
    pub execution_logs: ExecutionLogConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the given base file with `config/{env}.toml` and environment
    /// variables prefixed with `DANI__` (e.g. `DANI__DATABASE__URL`).
    pub fn load(config_path: &str, env: &str) -> Result<Self, AppError> {
        tracing::debug!(config_path, env, "Loading configuration");

        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DANI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_default_when_missing() {
        let parsed: AppConfig = serde_json::from_value(serde_json::json!({
            "database": { "url": "postgres://dani@localhost/dani" }
        }))
        .expect("minimal config");

        assert_eq!(parsed.database.max_connections, 10);
        assert_eq!(parsed.logging.level, "info");
        assert_eq!(parsed.execution_logs.default_page_size, 50);
    }
}
