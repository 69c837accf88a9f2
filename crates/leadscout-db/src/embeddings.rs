//! Database operations for the `post_embeddings` table.
//!
//! This is the durable tier of the embedding cache: vectors survive process
//! restarts so repeat encounters with the same post skip the embedding
//! service entirely.

use sqlx::PgPool;

use leadscout_core::Platform;

use crate::DbError;

/// Fetch a cached embedding for `(post_id, platform)`, or `None` on miss.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post_embedding(
    pool: &PgPool,
    post_id: &str,
    platform: Platform,
) -> Result<Option<Vec<f32>>, DbError> {
    let vector = sqlx::query_scalar::<_, Vec<f32>>(
        "SELECT embedding FROM post_embeddings WHERE post_id = $1 AND platform = $2",
    )
    .bind(post_id)
    .bind(platform.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(vector)
}

/// Store an embedding for `(post_id, platform)`, replacing any existing one.
///
/// Post content is immutable once fetched, so a replace only happens when
/// the embedding model changes; last write wins is the intended behavior.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_post_embedding(
    pool: &PgPool,
    post_id: &str,
    platform: Platform,
    embedding: &[f32],
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO post_embeddings (post_id, platform, embedding) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (post_id, platform) DO UPDATE SET embedding = EXCLUDED.embedding",
    )
    .bind(post_id)
    .bind(platform.as_str())
    .bind(embedding)
    .execute(pool)
    .await?;

    Ok(())
}
