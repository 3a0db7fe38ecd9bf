//! Database migration command.

use crate::output;
use dani_core::config::AppConfig;
use dani_core::error::AppError;

/// Run all pending migrations.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;

    let known = dani_database::migration::run_migrations(&pool).await?;
    output::print_success(&format!("Execution log schema up to date ({known} migrations)."));

    pool.close().await;
    Ok(())
}
