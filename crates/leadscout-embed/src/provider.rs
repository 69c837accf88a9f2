//! Two-tier read-through/write-through embedding provider.

use std::sync::Arc;
use std::time::Duration;

use leadscout_core::Platform;

use crate::backend::EmbeddingBackend;
use crate::cache::{normalize_text, post_key, text_key, DurableEmbeddingCache, FastCache};
use crate::error::EmbedError;

/// Cosine similarity: `dot(a, b) / (‖a‖ · ‖b‖)`.
///
/// Undefined (NaN) when either vector is all-zero — callers must guard
/// with `is_finite()` before comparing against a threshold.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b)
}

/// Fronts an [`EmbeddingBackend`] with the fast TTL tier and an optional
/// durable tier.
///
/// Lookup order for ad hoc text: fast tier → backend → fast tier.
/// Lookup order for content items: fast tier → durable tier (promoted into
/// the fast tier on hit) → backend → both tiers.
pub struct EmbeddingProvider {
    backend: Arc<dyn EmbeddingBackend>,
    fast: FastCache,
    durable: Option<Arc<dyn DurableEmbeddingCache>>,
}

impl EmbeddingProvider {
    #[must_use]
    pub fn new(backend: Arc<dyn EmbeddingBackend>, fast_ttl: Duration) -> Self {
        Self {
            backend,
            fast: FastCache::new(fast_ttl),
            durable: None,
        }
    }

    /// Attach a durable second tier for content-item embeddings.
    #[must_use]
    pub fn with_durable(mut self, durable: Arc<dyn DurableEmbeddingCache>) -> Self {
        self.durable = Some(durable);
        self
    }

    /// Embedding for ad hoc text (keywords, probes).
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError`] if the backend call fails after retries.
    pub async fn get_embedding(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let normalized = normalize_text(text);
        let key = text_key(&normalized);

        if let Some(vector) = self.fast.get(&key).await {
            return Ok(vector);
        }

        let vector = self.backend.embed(&normalized).await?;
        self.fast.insert(key, vector.clone()).await;
        Ok(vector)
    }

    /// Order-preserving batch embedding.
    ///
    /// Cached texts are short-circuited; the remainder goes to the backend
    /// in one batch call and results are re-placed at their original
    /// indices. Any backend failure fails the whole call — there is no
    /// partial-result contract.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError`] if the backend call fails after retries.
    pub async fn get_batch_embeddings(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut uncached: Vec<(usize, String)> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let normalized = normalize_text(text);
            let key = text_key(&normalized);
            match self.fast.get(&key).await {
                Some(vector) => results[i] = Some(vector),
                None => uncached.push((i, normalized)),
            }
        }

        if !uncached.is_empty() {
            let inputs: Vec<String> = uncached.iter().map(|(_, t)| t.clone()).collect();
            let vectors = self.backend.embed_batch(&inputs).await?;
            if vectors.len() != inputs.len() {
                return Err(EmbedError::CountMismatch {
                    expected: inputs.len(),
                    got: vectors.len(),
                });
            }
            for ((i, normalized), vector) in uncached.into_iter().zip(vectors) {
                self.fast
                    .insert(text_key(&normalized), vector.clone())
                    .await;
                results[i] = Some(vector);
            }
        }

        Ok(results.into_iter().flatten().collect())
    }

    /// Embedding for one content item, durable-cached by `(post_id,
    /// platform)`.
    ///
    /// Durable-tier failures are logged and treated as misses — a broken
    /// cache must not take down scoring.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError`] if the backend call fails after retries.
    pub async fn get_post_embedding(
        &self,
        post_id: &str,
        text: &str,
        platform: Platform,
    ) -> Result<Vec<f32>, EmbedError> {
        let key = post_key(platform, post_id);

        if let Some(vector) = self.fast.get(&key).await {
            return Ok(vector);
        }

        if let Some(durable) = &self.durable {
            match durable.get(post_id, platform).await {
                Ok(Some(vector)) => {
                    // Promote the durable hit so the next read stays local.
                    self.fast.insert(key, vector.clone()).await;
                    return Ok(vector);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(post_id, platform = %platform, error = %e, "durable cache read failed");
                }
            }
        }

        let normalized = normalize_text(text);
        let vector = self.backend.embed(&normalized).await?;

        if let Some(durable) = &self.durable {
            if let Err(e) = durable.put(post_id, platform, &vector).await {
                tracing::warn!(post_id, platform = %platform, error = %e, "durable cache write failed");
            }
        }
        self.fast.insert(key, vector.clone()).await;

        Ok(vector)
    }
}
