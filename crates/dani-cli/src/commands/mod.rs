//! CLI command definitions and dispatch.

pub mod logs;
pub mod migrate;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::output::OutputFormat;
use dani_core::config::AppConfig;
use dani_core::error::AppError;
use dani_service::AdminContext;

/// DANI execution log administration
#[derive(Debug, Parser)]
#[command(name = "dani", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from `config/<env>`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Administrator ID recorded in the access trail
    #[arg(long)]
    pub admin_id: Option<Uuid>,

    /// Administrator email recorded in the access trail
    #[arg(long)]
    pub admin_email: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run pending database migrations
    Migrate,
    /// Query, inspect and export execution logs
    Logs(logs::LogsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate => migrate::execute(config).await,
            Commands::Logs(args) => {
                let ctx = self.admin_context();
                logs::execute(args, config, &ctx, self.format).await
            }
        }
    }

    /// Identity used for audit attribution; the nil UUID when not given.
    fn admin_context(&self) -> AdminContext {
        AdminContext::new(self.admin_id.unwrap_or_else(Uuid::nil), self.admin_email.clone())
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str, env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path, env)
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<sqlx::PgPool, AppError> {
    dani_database::connection::connect(&config.database).await
}
