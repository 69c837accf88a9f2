//! Postgres-backed implementations of the pipeline's storage contracts.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use leadscout_core::{AgentConfig, LeadRecord, Platform, Storage, StorageError};
use leadscout_embed::{DurableEmbeddingCache, EmbedError};

use crate::{agents, embeddings, leads, usage, DbError};

/// Postgres-backed [`Storage`] and [`DurableEmbeddingCache`].
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<DbError> for StorageError {
    fn from(e: DbError) -> Self {
        StorageError::Backend(e.to_string())
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn load_agent_config(&self, agent_id: Uuid) -> Result<AgentConfig, StorageError> {
        agents::get_agent_config(&self.pool, agent_id)
            .await?
            .ok_or(StorageError::AgentNotFound(agent_id))
    }

    async fn existing_urls(&self, agent_id: Uuid) -> Result<HashSet<String>, StorageError> {
        let urls = leads::list_lead_urls(&self.pool, agent_id).await?;
        Ok(urls.into_iter().collect())
    }

    async fn insert_lead_if_absent(&self, record: &LeadRecord) -> Result<bool, StorageError> {
        Ok(leads::insert_lead_if_absent(&self.pool, record).await?)
    }

    async fn increment_monthly_usage(
        &self,
        user_id: Uuid,
        delta: i64,
    ) -> Result<(), StorageError> {
        Ok(usage::increment_monthly_usage(&self.pool, user_id, delta).await?)
    }

    async fn touch_agent_run_stats(&self, agent_id: Uuid) -> Result<(), StorageError> {
        Ok(usage::touch_agent_run_stats(&self.pool, agent_id).await?)
    }
}

#[async_trait]
impl DurableEmbeddingCache for PgStorage {
    async fn get(
        &self,
        post_id: &str,
        platform: Platform,
    ) -> Result<Option<Vec<f32>>, EmbedError> {
        embeddings::get_post_embedding(&self.pool, post_id, platform)
            .await
            .map_err(|e| EmbedError::DurableCache(e.to_string()))
    }

    async fn put(
        &self,
        post_id: &str,
        platform: Platform,
        embedding: &[f32],
    ) -> Result<(), EmbedError> {
        embeddings::upsert_post_embedding(&self.pool, post_id, platform, embedding)
            .await
            .map_err(|e| EmbedError::DurableCache(e.to_string()))
    }
}
