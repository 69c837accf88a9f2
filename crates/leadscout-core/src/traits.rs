//! Collaborator interfaces consumed by the pipeline.
//!
//! Scraping transport, persistent storage, and notification delivery are
//! out of scope for the core; each is injected as a trait object so the
//! pipeline can be exercised with in-memory fakes.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{AgentConfig, AgentRunOutcome, ContentItem, LeadRecord, Platform};

/// Content-source fetch failure. Caught per-platform by the pipeline.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(String),
}

/// Storage collaborator failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The agent does not exist. Fatal to the invocation.
    #[error("agent {0} not found")]
    AgentNotFound(Uuid),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// One platform's content source. Returns normalized items; fetch errors
/// are isolated per-platform by the caller.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// The platform this source serves.
    fn platform(&self) -> Platform;

    /// Fetch recent content matching any of the given keywords.
    async fn fetch(&self, keywords: &[String]) -> Result<Vec<ContentItem>, SourceError>;
}

/// Persistent storage contract for agent configuration, leads, and usage
/// counters.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load one agent's monitoring configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AgentNotFound`] if the agent does not exist.
    async fn load_agent_config(&self, agent_id: Uuid) -> Result<AgentConfig, StorageError>;

    /// URLs of all leads already persisted for this agent.
    async fn existing_urls(&self, agent_id: Uuid) -> Result<HashSet<String>, StorageError>;

    /// Insert a lead unless one already exists for `(agent_id, url)`.
    ///
    /// Returns `true` if a row was inserted, `false` on conflict. A
    /// duplicate is a no-op, never an error.
    async fn insert_lead_if_absent(&self, record: &LeadRecord) -> Result<bool, StorageError>;

    /// Atomically add `delta` to the user's monthly usage counter.
    async fn increment_monthly_usage(&self, user_id: Uuid, delta: i64)
        -> Result<(), StorageError>;

    /// Bump the agent's last-run timestamp and run counter.
    async fn touch_agent_run_stats(&self, agent_id: Uuid) -> Result<(), StorageError>;
}

/// Fire-and-forget notification delivery. Never awaited for correctness;
/// implementations must not panic.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, agent_id: Uuid, outcome: &AgentRunOutcome);
}
