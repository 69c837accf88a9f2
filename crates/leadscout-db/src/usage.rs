//! Database operations for the `usage_counters` table and agent run stats.

use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Atomically add `delta` to the user's counter for the current calendar
/// month, creating the period row on first use.
///
/// The period key is `date_trunc('month', now())`, so the counter resets by
/// construction when a new month starts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn increment_monthly_usage(
    pool: &PgPool,
    user_id: Uuid,
    delta: i64,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO usage_counters (user_id, period_start, leads_found) \
         VALUES ($1, date_trunc('month', now()), $2) \
         ON CONFLICT (user_id, period_start) \
         DO UPDATE SET leads_found = usage_counters.leads_found + EXCLUDED.leads_found",
    )
    .bind(user_id)
    .bind(delta)
    .execute(pool)
    .await?;

    Ok(())
}

/// Bump the agent's last-run timestamp and run counter.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the agent row does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn touch_agent_run_stats(pool: &PgPool, agent_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE agents SET last_run_at = now(), run_count = run_count + 1 WHERE id = $1",
    )
    .bind(agent_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
