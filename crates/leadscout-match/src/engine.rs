//! Unified exact + semantic match decision for one content item.

use std::sync::Arc;

use leadscout_core::{AgentConfig, ContentItem, IntentSignal, MatchType, SemanticMatch};
use leadscout_embed::EmbeddingProvider;
use leadscout_intent::IntentClassifier;

use crate::error::MatchError;
use crate::index::KeywordEmbeddingIndex;
use crate::keyword::KeywordMatcher;

/// Characters kept either side of the first matched keyword.
const CONTEXT_WINDOW_CHARS: usize = 100;
/// Fallback context length when no keyword occurrence is locatable.
const CONTEXT_FALLBACK_CHARS: usize = 200;
/// Length of the stored content excerpt.
const EXCERPT_CHARS: usize = 500;

/// Combines exact keyword matching, embedding similarity, and intent
/// classification into one match decision.
///
/// Holds no mutable state: the matcher and index are read-only after
/// construction, so [`analyze_content`](Self::analyze_content) is safe to
/// call concurrently for many content items. A keyword-set change requires
/// constructing a new engine (rebuild-then-swap).
pub struct SemanticMatchEngine {
    matcher: KeywordMatcher,
    index: Arc<KeywordEmbeddingIndex>,
    provider: Arc<EmbeddingProvider>,
    classifier: Arc<IntentClassifier>,
    semantic_threshold: f32,
    intent_enabled: bool,
}

impl SemanticMatchEngine {
    /// Build an engine for one agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Pattern`] if the keyword automaton cannot be
    /// built.
    pub fn new(
        config: &AgentConfig,
        index: Arc<KeywordEmbeddingIndex>,
        provider: Arc<EmbeddingProvider>,
        classifier: Arc<IntentClassifier>,
    ) -> Result<Self, MatchError> {
        let matcher = KeywordMatcher::new(&config.keywords, &config.excluded_keywords)?;
        Ok(Self {
            matcher,
            index,
            provider,
            classifier,
            semantic_threshold: config.semantic_threshold,
            intent_enabled: config.intent_analysis_enabled,
        })
    }

    /// Decide whether `item` matches the agent's configuration.
    ///
    /// Returns `None` when neither an exact nor a semantic match exists —
    /// a non-match is never represented as a zero-score record. Pass
    /// `precomputed` to reuse an already-computed content embedding.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Embed`] if the content embedding is needed but
    /// cannot be computed.
    pub async fn analyze_content(
        &self,
        item: &ContentItem,
        precomputed: Option<&[f32]>,
    ) -> Result<Option<SemanticMatch>, MatchError> {
        let combined = match &item.title {
            Some(title) => format!("{title} {}", item.body),
            None => item.body.clone(),
        };
        let normalized = combined.trim().to_lowercase();

        let matched_keywords = self.matcher.find_exact_matches(&normalized);

        let (semantic_variants, max_similarity) = if self.index.is_empty() {
            (Vec::new(), 0.0)
        } else {
            let embedding = match precomputed {
                Some(vector) => vector.to_vec(),
                None => {
                    self.provider
                        .get_post_embedding(&item.id, &normalized, item.platform)
                        .await?
                }
            };
            self.index
                .semantic_matches(&embedding, self.semantic_threshold)
        };

        if matched_keywords.is_empty() && semantic_variants.is_empty() {
            tracing::trace!(id = %item.id, platform = %item.platform, "no keyword or semantic match");
            return Ok(None);
        }

        let signal = if self.intent_enabled {
            let mut context_keywords = matched_keywords.clone();
            for variant in &semantic_variants {
                if !context_keywords.contains(variant) {
                    context_keywords.push(variant.clone());
                }
            }
            self.classifier.classify(&normalized, &context_keywords).await
        } else {
            IntentSignal::neutral_fallback("intent analysis disabled")
        };

        // Exact match dominates the score.
        let score = if matched_keywords.is_empty() {
            max_similarity
        } else {
            1.0
        };

        let match_type = match (matched_keywords.is_empty(), semantic_variants.is_empty()) {
            (false, false) => MatchType::Hybrid,
            (false, true) => MatchType::Exact,
            (true, _) => MatchType::Semantic,
        };

        tracing::debug!(
            id = %item.id,
            platform = %item.platform,
            match_type = ?match_type,
            score,
            exact = matched_keywords.len(),
            semantic = semantic_variants.len(),
            "content matched"
        );

        let first_keyword = matched_keywords
            .first()
            .or_else(|| semantic_variants.first());
        let context = extract_context(&normalized, first_keyword.map(String::as_str));

        Ok(Some(SemanticMatch {
            text: truncate_chars(&normalized, EXCERPT_CHARS).to_owned(),
            score,
            match_type,
            matched_keywords,
            semantic_variants,
            intent: signal.intent,
            confidence: signal.confidence,
            context,
        }))
    }
}

/// ±100-character window around the first occurrence of `keyword`, falling
/// back to the first 200 characters when the keyword is not locatable
/// (semantic-only matches). All boundaries are UTF-8-safe.
fn extract_context(text: &str, keyword: Option<&str>) -> String {
    if let Some(keyword) = keyword {
        if let Some(pos) = text.find(keyword) {
            let start = back_n_chars(text, pos, CONTEXT_WINDOW_CHARS);
            let end = forward_n_chars(text, pos + keyword.len(), CONTEXT_WINDOW_CHARS);
            return text[start..end].to_owned();
        }
    }
    truncate_chars(text, CONTEXT_FALLBACK_CHARS).to_owned()
}

/// Byte index `n` characters before `from`, clamped to the text start.
fn back_n_chars(text: &str, from: usize, n: usize) -> usize {
    let mut idx = from;
    let mut stepped = 0;
    while idx > 0 && stepped < n {
        idx -= 1;
        while idx > 0 && !text.is_char_boundary(idx) {
            idx -= 1;
        }
        stepped += 1;
    }
    idx
}

/// Byte index `n` characters after `from`, clamped to the text end.
fn forward_n_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(offset, _)| from + offset)
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
