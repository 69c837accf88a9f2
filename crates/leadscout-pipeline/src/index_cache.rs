//! Per-agent keyword embedding index cache.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use leadscout_embed::EmbeddingProvider;
use leadscout_match::{KeywordEmbeddingIndex, MatchError};

struct CachedIndex {
    /// The keyword set the index was built from, used for staleness checks.
    keywords: Vec<String>,
    index: Arc<KeywordEmbeddingIndex>,
}

/// Amortizes keyword embedding across pipeline runs.
///
/// An index is rebuilt only when the agent's keyword set changes, and the
/// rebuild happens outside the lock: in-flight matches keep their `Arc` to
/// the old index while the new one is swapped in (rebuild-then-swap, never
/// in-place mutation). Two runs racing on the same stale entry may both
/// build; last write wins, which is harmless since both indexes are
/// equivalent.
#[derive(Default)]
pub(crate) struct IndexCache {
    entries: Mutex<HashMap<Uuid, CachedIndex>>,
}

impl IndexCache {
    pub(crate) async fn get_or_build(
        &self,
        provider: &EmbeddingProvider,
        agent_id: Uuid,
        keywords: &[String],
    ) -> Result<Arc<KeywordEmbeddingIndex>, MatchError> {
        {
            let entries = self.entries.lock().await;
            if let Some(cached) = entries.get(&agent_id) {
                if cached.keywords == keywords {
                    return Ok(Arc::clone(&cached.index));
                }
            }
        }

        // No lock held across the embedding calls.
        let index = Arc::new(KeywordEmbeddingIndex::build(provider, keywords).await?);

        let mut entries = self.entries.lock().await;
        entries.insert(
            agent_id,
            CachedIndex {
                keywords: keywords.to_vec(),
                index: Arc::clone(&index),
            },
        );
        Ok(index)
    }
}
