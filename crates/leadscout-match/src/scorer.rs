//! Lead qualification and scoring.
//!
//! Pure functions of a [`SemanticMatch`] — no I/O, deterministic. The
//! weights (40/30/15/20/10/5 and 0.3/0.4/0.3) are behavioural constants
//! carried over unchanged; they are the de facto definition of what a lead
//! score means to downstream consumers.

use leadscout_core::{Intent, MatchType, SemanticMatch};

/// Strict conjunctive qualification: relevance, stance, and confidence must
/// all clear their thresholds — no partial credit.
#[must_use]
pub fn qualify_lead(m: &SemanticMatch) -> bool {
    m.score >= 0.8 && m.intent == Intent::Positive && m.confidence >= 0.7
}

/// Lead score in [0, 100]:
/// `round(min(100, score*40 + intent_bonus + confidence*20 + match_type_bonus))`.
///
/// The clamp is intentional saturation — the raw maximum is exactly 100 at
/// the boundary (1.0*40 + 30 + 1.0*20 + 10).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn calculate_lead_score(m: &SemanticMatch) -> i32 {
    let intent_bonus = match m.intent {
        Intent::Positive => 30.0,
        Intent::Neutral => 15.0,
        Intent::Negative => 0.0,
    };
    let match_type_bonus = match m.match_type {
        MatchType::Exact => 10.0,
        MatchType::Hybrid => 5.0,
        MatchType::Semantic => 0.0,
    };
    let raw = m.score * 40.0 + intent_bonus + m.confidence * 20.0 + match_type_bonus;
    raw.min(100.0).round() as i32
}

/// Buying-intent estimate in [0, 1]:
/// `min(1, (positive ? 0.3 : 0) + score*0.4 + confidence*0.3)`.
#[must_use]
pub fn calculate_buying_intent(m: &SemanticMatch) -> f32 {
    let intent_component = if m.intent == Intent::Positive { 0.3 } else { 0.0 };
    (intent_component + m.score * 0.4 + m.confidence * 0.3).min(1.0)
}

/// Sentiment as -1 / 0 / 1.
#[must_use]
pub fn sentiment_score(intent: Intent) -> i32 {
    match intent {
        Intent::Negative => -1,
        Intent::Neutral => 0,
        Intent::Positive => 1,
    }
}
