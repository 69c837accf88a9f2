//! Agent processing orchestration.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::{stream, StreamExt};
use thiserror::Error;
use uuid::Uuid;

use leadscout_core::{
    AgentConfig, AgentRunOutcome, AppConfig, ContentItem, LeadRecord, NotificationSink,
    SemanticMatch, Storage, StorageError,
};
use leadscout_embed::EmbeddingProvider;
use leadscout_intent::IntentClassifier;
use leadscout_match::{scorer, MatchError, SemanticMatchEngine};

use crate::index_cache::IndexCache;
use crate::registry::SourceRegistry;

/// Errors that escalate out of [`AgentPipeline::process_agent`].
///
/// Everything else — one platform's fetch failure, a single item's scoring
/// error or timeout — is contained and logged per the run's failure policy.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Keyword index construction failed; the run cannot match without it.
    #[error(transparent)]
    Match(#[from] MatchError),
}

/// Tunable pipeline knobs.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Content items scored concurrently. Bounded to respect external
    /// embedding/LLM rate limits.
    pub item_concurrency: usize,
    /// Upper bound on one item's external calls; a timed-out item is
    /// skipped, not retried.
    pub item_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            item_concurrency: 5,
            item_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            item_concurrency: config.item_concurrency,
            item_timeout: Duration::from_secs(config.item_timeout_secs),
        }
    }
}

enum ItemOutcome {
    Inserted { qualified: bool },
    Duplicate,
    NoMatch,
    Failed,
}

/// Orchestrates one agent's run: fetch → dedupe → match → score → persist.
pub struct AgentPipeline {
    storage: Arc<dyn Storage>,
    sources: SourceRegistry,
    provider: Arc<EmbeddingProvider>,
    classifier: Arc<IntentClassifier>,
    sink: Option<Arc<dyn NotificationSink>>,
    settings: PipelineSettings,
    index_cache: IndexCache,
}

impl AgentPipeline {
    #[must_use]
    pub fn new(
        storage: Arc<dyn Storage>,
        sources: SourceRegistry,
        provider: Arc<EmbeddingProvider>,
        classifier: Arc<IntentClassifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            storage,
            sources,
            provider,
            classifier,
            sink: None,
            settings,
            index_cache: IndexCache::default(),
        }
    }

    /// Attach a fire-and-forget notification sink.
    #[must_use]
    pub fn with_notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Process one agent end to end.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Storage`] if the agent config cannot be
    /// loaded (including not-found) or an aggregate counter write fails,
    /// and [`PipelineError::Match`] if the keyword index cannot be built.
    pub async fn process_agent(&self, agent_id: Uuid) -> Result<AgentRunOutcome, PipelineError> {
        let config = self.storage.load_agent_config(agent_id).await?;

        let index = self
            .index_cache
            .get_or_build(&self.provider, agent_id, &config.keywords)
            .await?;
        let engine = SemanticMatchEngine::new(
            &config,
            index,
            Arc::clone(&self.provider),
            Arc::clone(&self.classifier),
        )?;

        let mut outcome = AgentRunOutcome::default();

        // Fetch per platform; a failing platform is skipped, never fatal.
        let mut items: Vec<ContentItem> = Vec::new();
        for &platform in &config.platforms {
            let Some(source) = self.sources.get(platform) else {
                tracing::warn!(agent = %agent_id, platform = %platform, "no content source registered — skipping platform");
                outcome.platform_failures += 1;
                continue;
            };
            match source.fetch(&config.keywords).await {
                Ok(fetched) => {
                    tracing::debug!(agent = %agent_id, platform = %platform, count = fetched.len(), "fetched content");
                    items.extend(fetched);
                }
                Err(e) => {
                    tracing::warn!(agent = %agent_id, platform = %platform, error = %e, "platform fetch failed — skipping platform");
                    outcome.platform_failures += 1;
                }
            }
        }
        outcome.fetched = items.len();

        // Drop anything already persisted, plus in-batch URL collisions.
        let existing = self.storage.existing_urls(agent_id).await?;
        let mut seen: HashSet<String> = HashSet::new();
        items.retain(|item| !existing.contains(&item.url) && seen.insert(item.url.clone()));
        outcome.new_items = items.len();

        let engine = &engine;
        let config_ref = &config;
        let results: Vec<ItemOutcome> = stream::iter(items)
            .map(|item| async move {
                match tokio::time::timeout(
                    self.settings.item_timeout,
                    self.score_item(engine, config_ref, &item),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(agent = %agent_id, url = %item.url, "item scoring timed out — skipping");
                        ItemOutcome::Failed
                    }
                }
            })
            .buffer_unordered(self.settings.item_concurrency.max(1))
            .collect()
            .await;

        for result in results {
            match result {
                ItemOutcome::Inserted { qualified } => {
                    outcome.inserted += 1;
                    if qualified {
                        outcome.qualified += 1;
                    }
                }
                ItemOutcome::Duplicate | ItemOutcome::NoMatch => {}
                ItemOutcome::Failed => outcome.item_failures += 1,
            }
        }

        if outcome.inserted > 0 {
            #[allow(clippy::cast_possible_wrap)]
            self.storage
                .increment_monthly_usage(config.user_id, outcome.inserted as i64)
                .await?;
        }

        // Run stats are updated whether or not anything matched.
        self.storage.touch_agent_run_stats(agent_id).await?;

        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            let notified = outcome.clone();
            tokio::spawn(async move {
                sink.notify(agent_id, &notified).await;
            });
        }

        tracing::info!(
            agent = %agent_id,
            fetched = outcome.fetched,
            new_items = outcome.new_items,
            inserted = outcome.inserted,
            qualified = outcome.qualified,
            "agent run complete"
        );

        Ok(outcome)
    }

    /// Match, score, and persist one content item. Never returns an error;
    /// failures are logged and reported as [`ItemOutcome::Failed`] so one
    /// bad item cannot abort the batch.
    async fn score_item(
        &self,
        engine: &SemanticMatchEngine,
        config: &AgentConfig,
        item: &ContentItem,
    ) -> ItemOutcome {
        let matched = match engine.analyze_content(item, None).await {
            Ok(Some(matched)) => matched,
            Ok(None) => return ItemOutcome::NoMatch,
            Err(e) => {
                tracing::warn!(agent = %config.agent_id, url = %item.url, error = %e, "item analysis failed — skipping");
                return ItemOutcome::Failed;
            }
        };

        let record = build_lead_record(config, item, &matched);
        match self.storage.insert_lead_if_absent(&record).await {
            Ok(true) => ItemOutcome::Inserted {
                qualified: record.is_qualified_lead,
            },
            Ok(false) => ItemOutcome::Duplicate,
            Err(e) => {
                tracing::warn!(agent = %config.agent_id, url = %item.url, error = %e, "lead insert failed — skipping");
                ItemOutcome::Failed
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn build_lead_record(
    config: &AgentConfig,
    item: &ContentItem,
    matched: &SemanticMatch,
) -> LeadRecord {
    let mut keywords = matched.matched_keywords.clone();
    for variant in &matched.semantic_variants {
        if !keywords.contains(variant) {
            keywords.push(variant.clone());
        }
    }

    LeadRecord {
        agent_id: config.agent_id,
        platform: item.platform,
        platform_post_id: item.id.clone(),
        content: matched.text.clone(),
        url: item.url.clone(),
        relevance_score: (matched.score * 100.0).round() as i32,
        sentiment_score: scorer::sentiment_score(matched.intent),
        matched_keywords: keywords.join(","),
        semantic_score: (!matched.semantic_variants.is_empty()).then_some(matched.score),
        is_qualified_lead: scorer::qualify_lead(matched),
        lead_score: scorer::calculate_lead_score(matched),
        buying_intent: scorer::calculate_buying_intent(matched),
        post_created_at: item.created_at,
        discovered_at: Utc::now(),
    }
}
