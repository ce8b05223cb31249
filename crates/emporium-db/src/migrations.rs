//! # Schema Migrations
//!
//! The workspace schema lives in `migrations/sqlite/` and is compiled into
//! the binary, so deployments never ship loose SQL files. To evolve the
//! schema, add a file with the next sequence number
//! (`002_description.sql`); applied migrations are immutable history and
//! must never be edited in place.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded in `_sqlx_migrations`.
///
/// Idempotent; each migration runs inside its own transaction, in filename
/// order.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;

    info!(total = MIGRATOR.migrations.len(), "Migrations up to date");
    Ok(())
}

/// Returns (total_migrations, applied_migrations) for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
