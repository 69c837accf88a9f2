use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Social platform a content item was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Reddit,
    Twitter,
    Linkedin,
    Bluesky,
}

impl Platform {
    /// Lowercase string form used for storage and cache keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Reddit => "reddit",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Bluesky => "bluesky",
        }
    }

    /// Parse a stored platform string. Returns `None` for unknown values
    /// so callers can skip rows written by a newer schema revision.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reddit" => Some(Platform::Reddit),
            "twitter" => Some(Platform::Twitter),
            "linkedin" => Some(Platform::Linkedin),
            "bluesky" => Some(Platform::Bluesky),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-agent monitoring configuration. Created and edited by the UI layer;
/// read-only to the pipeline.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub agent_id: Uuid,
    pub user_id: Uuid,
    /// Required, non-empty.
    pub keywords: Vec<String>,
    pub excluded_keywords: Vec<String>,
    pub platforms: Vec<Platform>,
    /// Minimum cosine similarity for a semantic match, in [0, 1].
    pub semantic_threshold: f32,
    pub intent_analysis_enabled: bool,
}

/// One fetched post/comment, normalized to a common shape by the content
/// source. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Platform-scoped unique identifier.
    pub id: String,
    pub title: Option<String>,
    pub body: String,
    /// Dedupe key within an agent's scope.
    pub url: String,
    pub author: String,
    /// Community name, e.g. a subreddit.
    pub community: String,
    pub platform: Platform,
    pub created_at: DateTime<Utc>,
    /// Engagement counters and other source-specific extras.
    pub metadata: serde_json::Value,
}

/// Stance of a piece of text toward the matched keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Positive,
    Negative,
    Neutral,
}

impl Intent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Positive => "positive",
            Intent::Negative => "negative",
            Intent::Neutral => "neutral",
        }
    }
}

/// Classifier output: stance plus confidence and a short explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentSignal {
    pub intent: Intent,
    /// In [0, 1].
    pub confidence: f32,
    pub explanation: String,
}

impl IntentSignal {
    /// The documented degradation value used whenever classification fails
    /// or is disabled.
    #[must_use]
    pub fn neutral_fallback(explanation: &str) -> Self {
        Self {
            intent: Intent::Neutral,
            confidence: 0.5,
            explanation: explanation.to_string(),
        }
    }
}

/// How a content item matched the agent's keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Semantic,
    Hybrid,
}

/// A positive match decision for one content item.
///
/// Only produced when at least one keyword or semantic variant matched —
/// a non-match is represented as `None`, never as a zero-score record.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch {
    /// Truncated excerpt of the normalized content text.
    pub text: String,
    /// Overall score in [0, 1]; 1.0 whenever any exact match exists.
    pub score: f32,
    pub match_type: MatchType,
    /// Exact keyword hits in first-occurrence order, deduplicated.
    pub matched_keywords: Vec<String>,
    /// Keywords matched via embedding similarity, in index order.
    pub semantic_variants: Vec<String>,
    pub intent: Intent,
    pub confidence: f32,
    /// Windowed excerpt around the first matched keyword.
    pub context: String,
}

/// A persisted, scored lead. Unique per `(agent_id, url)`; append-only.
#[derive(Debug, Clone)]
pub struct LeadRecord {
    pub agent_id: Uuid,
    pub platform: Platform,
    pub platform_post_id: String,
    pub content: String,
    pub url: String,
    /// In [0, 100].
    pub relevance_score: i32,
    /// -1, 0, or 1.
    pub sentiment_score: i32,
    /// Comma-joined matched keyword list.
    pub matched_keywords: String,
    pub semantic_score: Option<f32>,
    pub is_qualified_lead: bool,
    /// In [0, 100].
    pub lead_score: i32,
    /// In [0, 1].
    pub buying_intent: f32,
    pub post_created_at: DateTime<Utc>,
    pub discovered_at: DateTime<Utc>,
}

/// Accounting for one `process_agent` run, handed to the notification sink
/// and returned to the scheduler layer.
#[derive(Debug, Clone, Default)]
pub struct AgentRunOutcome {
    pub fetched: usize,
    /// Items remaining after URL deduplication against history.
    pub new_items: usize,
    /// Leads actually inserted (conflict-ignore duplicates excluded).
    pub inserted: usize,
    /// Inserted leads that met the qualification threshold.
    pub qualified: usize,
    /// Platforms whose fetch failed and was skipped.
    pub platform_failures: usize,
    /// Items that errored or timed out during scoring and were skipped.
    pub item_failures: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips_through_strings() {
        for p in [
            Platform::Reddit,
            Platform::Twitter,
            Platform::Linkedin,
            Platform::Bluesky,
        ] {
            assert_eq!(Platform::parse(p.as_str()), Some(p));
        }
    }

    #[test]
    fn unknown_platform_parses_to_none() {
        assert_eq!(Platform::parse("myspace"), None);
    }

    #[test]
    fn platform_serde_uses_lowercase() {
        let json = serde_json::to_string(&Platform::Reddit).unwrap();
        assert_eq!(json, "\"reddit\"");
    }

    #[test]
    fn neutral_fallback_has_half_confidence() {
        let signal = IntentSignal::neutral_fallback("error");
        assert_eq!(signal.intent, Intent::Neutral);
        assert!((signal.confidence - 0.5).abs() < f32::EPSILON);
        assert_eq!(signal.explanation, "error");
    }
}
