//! Postgres persistence for agents, leads, usage counters, and the durable
//! embedding cache.

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

use leadscout_core::AppConfig;

// Path relative to crates/leadscout-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect a Postgres pool sized per the application configuration.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect(&config.database_url)
        .await
}

/// Run all pending migrations against the pool. Idempotent: already-applied
/// migrations are skipped.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

pub mod agents;
pub mod embeddings;
pub mod leads;
pub mod storage;
pub mod usage;

pub use agents::{get_agent_config, AgentRow};
pub use embeddings::{get_post_embedding, upsert_post_embedding};
pub use leads::{insert_lead_if_absent, list_lead_urls};
pub use storage::PgStorage;
pub use usage::{increment_monthly_usage, touch_agent_run_stats};
