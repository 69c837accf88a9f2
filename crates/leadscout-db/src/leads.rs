//! Database operations for the `leads` table.

use sqlx::PgPool;
use uuid::Uuid;

use leadscout_core::LeadRecord;

use crate::DbError;

/// URLs of all leads persisted for an agent, used as the dedupe set before
/// scoring a fetched batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_lead_urls(pool: &PgPool, agent_id: Uuid) -> Result<Vec<String>, DbError> {
    let urls = sqlx::query_scalar::<_, String>("SELECT url FROM leads WHERE agent_id = $1")
        .bind(agent_id)
        .fetch_all(pool)
        .await?;

    Ok(urls)
}

/// Insert a lead unless one already exists for `(agent_id, url)`.
///
/// Returns `true` if a row was inserted, `false` if the unique constraint
/// swallowed it. Concurrent runs racing on the same URL both succeed; only
/// one observes an insert.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails for any reason other than
/// the `(agent_id, url)` conflict.
pub async fn insert_lead_if_absent(pool: &PgPool, record: &LeadRecord) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO leads \
             (agent_id, platform, platform_post_id, content, url, \
              relevance_score, sentiment_score, matched_keywords, semantic_score, \
              is_qualified_lead, lead_score, buying_intent, \
              post_created_at, discovered_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (agent_id, url) DO NOTHING",
    )
    .bind(record.agent_id)
    .bind(record.platform.as_str())
    .bind(&record.platform_post_id)
    .bind(&record.content)
    .bind(&record.url)
    .bind(record.relevance_score)
    .bind(record.sentiment_score)
    .bind(&record.matched_keywords)
    .bind(record.semantic_score)
    .bind(record.is_qualified_lead)
    .bind(record.lead_score)
    .bind(record.buying_intent)
    .bind(record.post_created_at)
    .bind(record.discovered_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
