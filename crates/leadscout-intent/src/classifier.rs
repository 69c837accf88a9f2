//! Intent classification with the documented neutral degradation.

use std::sync::Arc;

use serde::Deserialize;

use leadscout_core::{Intent, IntentSignal};

use crate::backend::LlmBackend;
use crate::error::IntentError;
use crate::parse::extract_json;
use crate::retry::retry_with_backoff;

/// Content text is truncated to this many characters before prompting.
const MAX_PROMPT_CONTENT_CHARS: usize = 1500;

#[derive(Deserialize)]
struct RawIntent {
    intent: String,
    confidence: f32,
    #[serde(default)]
    explanation: String,
}

/// Classifies a text's stance toward a set of matched keywords.
pub struct IntentClassifier {
    backend: Arc<dyn LlmBackend>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl IntentClassifier {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            backend,
            max_retries,
            backoff_base_ms,
        }
    }

    /// Classify `text` as positive/negative/neutral buying intent.
    ///
    /// Infallible by contract: any failure — transport after retries,
    /// non-JSON output, unknown intent label — degrades to
    /// `{neutral, 0.5, "error"}` with a logged warning.
    pub async fn classify(&self, text: &str, keywords: &[String]) -> IntentSignal {
        let prompt = build_prompt(text, keywords);

        let completion = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.backend.complete(&prompt)
        })
        .await;

        let raw = match completion {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "intent classification failed — using neutral fallback");
                return IntentSignal::neutral_fallback("error");
            }
        };

        match parse_signal(&raw) {
            Ok(signal) => signal,
            Err(e) => {
                tracing::warn!(error = %e, "intent response unparseable — using neutral fallback");
                IntentSignal::neutral_fallback("error")
            }
        }
    }
}

fn parse_signal(raw: &str) -> Result<IntentSignal, IntentError> {
    let payload = extract_json(raw)
        .ok_or_else(|| IntentError::Malformed("no JSON object in completion".to_owned()))?;

    let parsed: RawIntent = serde_json::from_str(&payload)
        .map_err(|e| IntentError::Malformed(format!("intent JSON parse error: {e}")))?;

    let intent = match parsed.intent.to_lowercase().as_str() {
        "positive" => Intent::Positive,
        "negative" => Intent::Negative,
        "neutral" => Intent::Neutral,
        other => {
            return Err(IntentError::Malformed(format!(
                "unknown intent label: {other}"
            )));
        }
    };

    Ok(IntentSignal {
        intent,
        confidence: parsed.confidence.clamp(0.0, 1.0),
        explanation: parsed.explanation,
    })
}

fn build_prompt(text: &str, keywords: &[String]) -> String {
    let truncated = truncate_chars(text, MAX_PROMPT_CONTENT_CHARS);
    format!(
        "You are scoring a social-media post for buying intent.\n\
         The post matched these monitored keywords: {}.\n\n\
         Post:\n{truncated}\n\n\
         Classify the author's stance toward the matched topic as one of \
         \"positive\" (expresses interest, need, or purchase intent), \
         \"negative\" (complaint or rejection), or \"neutral\".\n\
         Respond with ONLY a JSON object, no code fences:\n\
         {{\"intent\": \"positive|negative|neutral\", \"confidence\": 0.0, \"explanation\": \"one sentence\"}}",
        keywords.join(", ")
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
