//! Database operations for the `agents` table.

use sqlx::PgPool;
use uuid::Uuid;

use leadscout_core::{AgentConfig, Platform};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `agents` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AgentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub keywords: Vec<String>,
    pub excluded_keywords: Vec<String>,
    pub platforms: Vec<String>,
    pub semantic_threshold: f32,
    pub intent_analysis_enabled: bool,
}

impl AgentRow {
    /// Convert the stored row into the pipeline's config type.
    ///
    /// Platform strings that no longer parse (written by a newer schema
    /// revision) are skipped with a warning rather than failing the run.
    #[must_use]
    pub fn into_config(self) -> AgentConfig {
        let platforms = self
            .platforms
            .iter()
            .filter_map(|s| {
                let parsed = Platform::parse(s);
                if parsed.is_none() {
                    tracing::warn!(agent = %self.id, platform = %s, "unknown platform in agent row — skipping");
                }
                parsed
            })
            .collect();

        AgentConfig {
            agent_id: self.id,
            user_id: self.user_id,
            keywords: self.keywords,
            excluded_keywords: self.excluded_keywords,
            platforms,
            semantic_threshold: self.semantic_threshold,
            intent_analysis_enabled: self.intent_analysis_enabled,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Load one agent's monitoring configuration, or `None` if the agent does
/// not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_agent_config(
    pool: &PgPool,
    agent_id: Uuid,
) -> Result<Option<AgentConfig>, DbError> {
    let row = sqlx::query_as::<_, AgentRow>(
        "SELECT id, user_id, keywords, excluded_keywords, platforms, \
                semantic_threshold, intent_analysis_enabled \
         FROM agents \
         WHERE id = $1",
    )
    .bind(agent_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(AgentRow::into_config))
}
