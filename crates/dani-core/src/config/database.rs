//! Connection settings for the execution log database.

use serde::{Deserialize, Serialize};

/// Where execution logs live and how the pool talks to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Pool ceiling. Statistics fan out six statements at once, so keep
    /// this at least that high.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept warm between commands.
    #[serde(default)]
    pub min_connections: u32,
    /// Seconds to wait for a free connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    /// Seconds before an idle connection is dropped.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Server-side `statement_timeout` in milliseconds; `0` (the default)
    /// leaves statements unbounded.
    #[serde(default)]
    pub statement_timeout_ms: u64,
    /// Reported to Postgres as `application_name`.
    #[serde(default = "default_application_name")]
    pub application_name: String,
}

impl DatabaseConfig {
    /// Smallest pool that still lets one statistics request run its
    /// statements concurrently.
    pub const MIN_STATS_CONCURRENCY: u32 = 6;

    /// The configured pool ceiling, raised to [`Self::MIN_STATS_CONCURRENCY`].
    pub fn effective_max_connections(&self) -> u32 {
        self.max_connections.max(Self::MIN_STATS_CONCURRENCY)
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_application_name() -> String {
    "dani-logs".to_string()
}
