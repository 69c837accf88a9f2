//! End-to-end pipeline tests with in-memory collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use leadscout_core::{
    AgentConfig, AgentRunOutcome, ContentItem, ContentSource, NotificationSink, Platform,
    SourceError, Storage, StorageError,
};
use leadscout_embed::{EmbedError, EmbeddingBackend, EmbeddingProvider};
use leadscout_intent::{IntentClassifier, IntentError, LlmBackend};
use leadscout_pipeline::{AgentPipeline, PipelineError, PipelineSettings, SourceRegistry};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryStorage {
    configs: Mutex<HashMap<Uuid, AgentConfig>>,
    leads: Mutex<HashSet<(Uuid, String)>>,
    usage: Mutex<HashMap<Uuid, i64>>,
    run_counts: Mutex<HashMap<Uuid, u32>>,
}

impl MemoryStorage {
    fn with_agent(config: AgentConfig) -> Arc<Self> {
        let storage = Self::default();
        storage
            .configs
            .lock()
            .unwrap()
            .insert(config.agent_id, config);
        Arc::new(storage)
    }

    fn lead_count(&self) -> usize {
        self.leads.lock().unwrap().len()
    }

    fn usage_for(&self, user_id: Uuid) -> i64 {
        self.usage.lock().unwrap().get(&user_id).copied().unwrap_or(0)
    }

    fn run_count(&self, agent_id: Uuid) -> u32 {
        self.run_counts
            .lock()
            .unwrap()
            .get(&agent_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load_agent_config(&self, agent_id: Uuid) -> Result<AgentConfig, StorageError> {
        self.configs
            .lock()
            .unwrap()
            .get(&agent_id)
            .cloned()
            .ok_or(StorageError::AgentNotFound(agent_id))
    }

    async fn existing_urls(&self, agent_id: Uuid) -> Result<HashSet<String>, StorageError> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .iter()
            .filter(|(agent, _)| *agent == agent_id)
            .map(|(_, url)| url.clone())
            .collect())
    }

    async fn insert_lead_if_absent(
        &self,
        record: &leadscout_core::LeadRecord,
    ) -> Result<bool, StorageError> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .insert((record.agent_id, record.url.clone())))
    }

    async fn increment_monthly_usage(
        &self,
        user_id: Uuid,
        delta: i64,
    ) -> Result<(), StorageError> {
        *self.usage.lock().unwrap().entry(user_id).or_insert(0) += delta;
        Ok(())
    }

    async fn touch_agent_run_stats(&self, agent_id: Uuid) -> Result<(), StorageError> {
        *self.run_counts.lock().unwrap().entry(agent_id).or_insert(0) += 1;
        Ok(())
    }
}

struct StaticSource {
    platform: Platform,
    items: Vec<ContentItem>,
}

#[async_trait]
impl ContentSource for StaticSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, _keywords: &[String]) -> Result<Vec<ContentItem>, SourceError> {
        Ok(self.items.clone())
    }
}

struct FailingSource(Platform);

#[async_trait]
impl ContentSource for FailingSource {
    fn platform(&self) -> Platform {
        self.0
    }

    async fn fetch(&self, _keywords: &[String]) -> Result<Vec<ContentItem>, SourceError> {
        Err(SourceError::Fetch("rate limited".to_owned()))
    }
}

/// Embeds "crm"-flavoured texts on one axis, everything else on the other.
struct StaticBackend {
    batch_calls: AtomicUsize,
}

impl StaticBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            batch_calls: AtomicUsize::new(0),
        })
    }

    fn vector_for(text: &str) -> Vec<f32> {
        if text.contains("crm") {
            vec![1.0, 0.0]
        } else {
            vec![0.0, 1.0]
        }
    }
}

#[async_trait]
impl EmbeddingBackend for StaticBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }
}

/// Errors on single-text embeds whose text contains "unembeddable".
struct FlakyBackend;

#[async_trait]
impl EmbeddingBackend for FlakyBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.contains("unembeddable") {
            return Err(EmbedError::Parse("truncated body".to_owned()));
        }
        Ok(StaticBackend::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| StaticBackend::vector_for(t)).collect())
    }
}

/// Stalls single-text embeds whose text contains "molasses".
struct SlowBackend;

#[async_trait]
impl EmbeddingBackend for SlowBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.contains("molasses") {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(StaticBackend::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| StaticBackend::vector_for(t)).collect())
    }
}

struct PositiveLlm;

#[async_trait]
impl LlmBackend for PositiveLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, IntentError> {
        Ok(r#"{"intent": "positive", "confidence": 0.8, "explanation": "test"}"#.to_owned())
    }
}

struct ChannelSink {
    tx: tokio::sync::mpsc::UnboundedSender<AgentRunOutcome>,
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn notify(&self, _agent_id: Uuid, outcome: &AgentRunOutcome) {
        let _ = self.tx.send(outcome.clone());
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn agent_config(platforms: Vec<Platform>) -> AgentConfig {
    AgentConfig {
        agent_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        keywords: vec!["crm".to_owned()],
        excluded_keywords: vec!["spam".to_owned()],
        platforms,
        semantic_threshold: 0.7,
        intent_analysis_enabled: true,
    }
}

fn reddit_item(id: &str, body: &str) -> ContentItem {
    ContentItem {
        id: id.to_owned(),
        title: None,
        body: body.to_owned(),
        url: format!("https://reddit.com/{id}"),
        author: "u/poster".to_owned(),
        community: "sales".to_owned(),
        platform: Platform::Reddit,
        created_at: Utc::now(),
        metadata: serde_json::Value::Null,
    }
}

fn pipeline_with_settings(
    storage: Arc<MemoryStorage>,
    sources: SourceRegistry,
    backend: Arc<dyn EmbeddingBackend>,
    settings: PipelineSettings,
) -> AgentPipeline {
    let provider = Arc::new(EmbeddingProvider::new(backend, Duration::from_secs(60)));
    let classifier = Arc::new(IntentClassifier::new(Arc::new(PositiveLlm), 0, 0));
    AgentPipeline::new(storage, sources, provider, classifier, settings)
}

fn pipeline(
    storage: Arc<MemoryStorage>,
    sources: SourceRegistry,
    backend: Arc<StaticBackend>,
) -> AgentPipeline {
    pipeline_with_settings(storage, sources, backend, PipelineSettings::default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_agent_is_fatal() {
    let storage = Arc::new(MemoryStorage::default());
    let p = pipeline(storage, SourceRegistry::new(), StaticBackend::new());
    let err = p.process_agent(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Storage(StorageError::AgentNotFound(_))
    ));
}

#[tokio::test]
async fn matching_items_become_leads_and_usage_is_counted() {
    let config = agent_config(vec![Platform::Reddit]);
    let agent_id = config.agent_id;
    let user_id = config.user_id;
    let storage = MemoryStorage::with_agent(config);

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(StaticSource {
        platform: Platform::Reddit,
        items: vec![
            reddit_item("t3_match", "looking for a good crm tool"),
            reddit_item("t3_miss", "my cat likes soup"),
        ],
    }));

    let p = pipeline(Arc::clone(&storage), sources, StaticBackend::new());
    let outcome = p.process_agent(agent_id).await.unwrap();

    assert_eq!(outcome.fetched, 2);
    assert_eq!(outcome.new_items, 2);
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.qualified, 1, "exact+positive+0.8 qualifies");
    assert_eq!(storage.lead_count(), 1);
    assert_eq!(storage.usage_for(user_id), 1);
    assert_eq!(storage.run_count(agent_id), 1);
}

#[tokio::test]
async fn reprocessing_is_idempotent_and_usage_counted_once() {
    let config = agent_config(vec![Platform::Reddit]);
    let agent_id = config.agent_id;
    let user_id = config.user_id;
    let storage = MemoryStorage::with_agent(config);

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(StaticSource {
        platform: Platform::Reddit,
        items: vec![reddit_item("t3_same", "which crm should I buy")],
    }));

    let p = pipeline(Arc::clone(&storage), sources, StaticBackend::new());

    let first = p.process_agent(agent_id).await.unwrap();
    assert_eq!(first.inserted, 1);

    // Same content fetched again in a later run.
    let second = p.process_agent(agent_id).await.unwrap();
    assert_eq!(second.new_items, 0, "known URL filtered before scoring");
    assert_eq!(second.inserted, 0);

    assert_eq!(storage.lead_count(), 1);
    assert_eq!(storage.usage_for(user_id), 1, "usage incremented once total");
    assert_eq!(storage.run_count(agent_id), 2, "run stats touched every run");
}

#[tokio::test]
async fn in_batch_duplicate_urls_collapse() {
    let config = agent_config(vec![Platform::Reddit]);
    let agent_id = config.agent_id;
    let storage = MemoryStorage::with_agent(config);

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(StaticSource {
        platform: Platform::Reddit,
        items: vec![
            reddit_item("t3_dup", "crm advice"),
            reddit_item("t3_dup", "crm advice"),
        ],
    }));

    let p = pipeline(Arc::clone(&storage), sources, StaticBackend::new());
    let outcome = p.process_agent(agent_id).await.unwrap();

    assert_eq!(outcome.fetched, 2);
    assert_eq!(outcome.new_items, 1);
    assert_eq!(outcome.inserted, 1);
}

#[tokio::test]
async fn one_platform_failure_does_not_abort_the_run() {
    let config = agent_config(vec![Platform::Twitter, Platform::Reddit]);
    let agent_id = config.agent_id;
    let storage = MemoryStorage::with_agent(config);

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(FailingSource(Platform::Twitter)));
    sources.register(Arc::new(StaticSource {
        platform: Platform::Reddit,
        items: vec![reddit_item("t3_ok", "need a crm")],
    }));

    let p = pipeline(Arc::clone(&storage), sources, StaticBackend::new());
    let outcome = p.process_agent(agent_id).await.unwrap();

    assert_eq!(outcome.platform_failures, 1);
    assert_eq!(outcome.inserted, 1, "healthy platform still processed");
}

#[tokio::test]
async fn unregistered_platform_is_skipped() {
    let config = agent_config(vec![Platform::Bluesky]);
    let agent_id = config.agent_id;
    let storage = MemoryStorage::with_agent(config);

    let p = pipeline(Arc::clone(&storage), SourceRegistry::new(), StaticBackend::new());
    let outcome = p.process_agent(agent_id).await.unwrap();

    assert_eq!(outcome.platform_failures, 1);
    assert_eq!(outcome.fetched, 0);
    assert_eq!(storage.run_count(agent_id), 1);
}

#[tokio::test]
async fn excluded_keyword_suppresses_exact_but_not_semantic_matching() {
    let config = agent_config(vec![Platform::Reddit]);
    let agent_id = config.agent_id;
    let storage = MemoryStorage::with_agent(config);

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(StaticSource {
        platform: Platform::Reddit,
        // The exclusion suppresses exact matching; the semantic path may
        // still fire, which is why the lead ends up non-exact.
        items: vec![reddit_item("t3_spam", "crm spam bot")],
    }));

    let p = pipeline(Arc::clone(&storage), sources, StaticBackend::new());
    let outcome = p.process_agent(agent_id).await.unwrap();
    assert_eq!(outcome.inserted, 1);
}

#[tokio::test]
async fn keyword_index_is_reused_across_runs() {
    let config = agent_config(vec![Platform::Reddit]);
    let agent_id = config.agent_id;
    let storage = MemoryStorage::with_agent(config);
    let backend = StaticBackend::new();

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(StaticSource {
        platform: Platform::Reddit,
        items: Vec::new(),
    }));

    let p = pipeline(Arc::clone(&storage), sources, Arc::clone(&backend));
    p.process_agent(agent_id).await.unwrap();
    p.process_agent(agent_id).await.unwrap();

    assert_eq!(
        backend.batch_calls.load(Ordering::SeqCst),
        1,
        "keyword embeddings built once per keyword set"
    );
}

#[tokio::test]
async fn failing_item_is_counted_and_does_not_abort_the_batch() {
    let config = agent_config(vec![Platform::Reddit]);
    let agent_id = config.agent_id;
    let storage = MemoryStorage::with_agent(config);

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(StaticSource {
        platform: Platform::Reddit,
        items: vec![
            reddit_item("t3_ok", "which crm do you use"),
            reddit_item("t3_broken", "crm but unembeddable"),
        ],
    }));

    let p = pipeline_with_settings(
        Arc::clone(&storage),
        sources,
        Arc::new(FlakyBackend),
        PipelineSettings::default(),
    );
    let outcome = p.process_agent(agent_id).await.unwrap();

    assert_eq!(outcome.new_items, 2);
    assert_eq!(outcome.item_failures, 1, "bad item skipped, not fatal");
    assert_eq!(outcome.inserted, 1, "healthy item still persisted");
    assert_eq!(storage.lead_count(), 1);
}

#[tokio::test]
async fn slow_item_times_out_without_aborting_the_run() {
    let config = agent_config(vec![Platform::Reddit]);
    let agent_id = config.agent_id;
    let storage = MemoryStorage::with_agent(config);

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(StaticSource {
        platform: Platform::Reddit,
        items: vec![
            reddit_item("t3_fast", "crm recommendations please"),
            reddit_item("t3_stuck", "crm slow as molasses"),
        ],
    }));

    let settings = PipelineSettings {
        item_concurrency: 5,
        item_timeout: Duration::from_millis(100),
    };
    let p = pipeline_with_settings(Arc::clone(&storage), sources, Arc::new(SlowBackend), settings);
    let outcome = p.process_agent(agent_id).await.unwrap();

    assert_eq!(outcome.item_failures, 1, "stalled item timed out");
    assert_eq!(outcome.inserted, 1);
    assert_eq!(storage.lead_count(), 1);
}

#[tokio::test]
async fn notification_sink_receives_the_outcome() {
    let config = agent_config(vec![Platform::Reddit]);
    let agent_id = config.agent_id;
    let storage = MemoryStorage::with_agent(config);

    let mut sources = SourceRegistry::new();
    sources.register(Arc::new(StaticSource {
        platform: Platform::Reddit,
        items: vec![reddit_item("t3_notify", "crm wanted")],
    }));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let p = pipeline(Arc::clone(&storage), sources, StaticBackend::new())
        .with_notification_sink(Arc::new(ChannelSink { tx }));

    p.process_agent(agent_id).await.unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("notification should arrive")
        .expect("channel open");
    assert_eq!(outcome.inserted, 1);
}
