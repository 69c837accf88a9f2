//! Keyword embedding index for semantic matching.

use leadscout_embed::{cosine_similarity, EmbeddingProvider};

use crate::error::MatchError;

/// Immutable mapping from lowercased keyword to its embedding vector.
///
/// Built once per keyword set and shared read-only by concurrent matching
/// calls. A keyword-set change requires building a fresh index and swapping
/// it in; instances are never mutated in place.
pub struct KeywordEmbeddingIndex {
    entries: Vec<(String, Vec<f32>)>,
}

impl KeywordEmbeddingIndex {
    /// Embed all keywords in one batch call and build the index.
    ///
    /// Keywords are normalized (trim + lowercase) and deduplicated,
    /// preserving configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Embed`] if the batch embedding call fails.
    pub async fn build(
        provider: &EmbeddingProvider,
        keywords: &[String],
    ) -> Result<Self, MatchError> {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let k = keyword.trim().to_lowercase();
            if !k.is_empty() && !normalized.contains(&k) {
                normalized.push(k);
            }
        }

        if normalized.is_empty() {
            return Ok(Self {
                entries: Vec::new(),
            });
        }

        let vectors = provider.get_batch_embeddings(&normalized).await?;
        Ok(Self {
            entries: normalized.into_iter().zip(vectors).collect(),
        })
    }

    /// Build directly from precomputed `(keyword, vector)` pairs.
    #[must_use]
    pub fn from_entries(entries: Vec<(String, Vec<f32>)>) -> Self {
        Self { entries }
    }

    /// Compare a content embedding against every indexed keyword.
    ///
    /// Returns the keywords whose similarity meets `threshold` (in index
    /// order) and the maximum similarity observed across all keywords,
    /// whether or not that keyword cleared the threshold. Non-finite
    /// similarities (zero-norm vectors) are skipped.
    #[must_use]
    pub fn semantic_matches(&self, content: &[f32], threshold: f32) -> (Vec<String>, f32) {
        let mut variants = Vec::new();
        let mut max_similarity = 0.0f32;

        for (keyword, vector) in &self.entries {
            let similarity = cosine_similarity(content, vector);
            if !similarity.is_finite() {
                continue;
            }
            if similarity > max_similarity {
                max_similarity = similarity;
            }
            if similarity >= threshold {
                variants.push(keyword.clone());
            }
        }

        (variants, max_similarity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indexed keywords, in build order.
    #[must_use]
    pub fn keywords(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }
}
