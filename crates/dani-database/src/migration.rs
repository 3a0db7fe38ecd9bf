//! Schema for `execution_logs` and `admin_access_logs`.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::{debug, info};

use dani_core::error::{AppError, ErrorKind};

/// Embedded migrations from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply pending migrations and return how many the schema knows about.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, AppError> {
    for migration in MIGRATOR.iter() {
        debug!(version = migration.version, description = %migration.description, "Known migration");
    }

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to migrate execution log schema: {e}"),
            e,
        )
    })?;

    let known = MIGRATOR.iter().count();
    info!(migrations = known, "Execution log schema up to date");
    Ok(known)
}
