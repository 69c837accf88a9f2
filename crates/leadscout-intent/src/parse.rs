//! Lenient extraction of a JSON object from LLM text output.
//!
//! Models wrap JSON in code fences or pad it with prose despite being asked
//! for bare JSON. Extraction is best-effort with a documented fallback at
//! the classifier level; a failed parse is never fatal.

use std::sync::OnceLock;

use regex::Regex;

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence regex is valid")
    })
}

/// Pull the JSON object payload out of a raw completion.
///
/// Tries, in order: a fenced ```` ```json ```` block, then the outermost
/// `{`..`}` span, then the raw trimmed text. Returns `None` only when no
/// brace pair exists at all.
#[must_use]
pub fn extract_json(raw: &str) -> Option<String> {
    if let Some(captures) = fence_re().captures(raw) {
        return Some(captures[1].to_string());
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(raw[start..=end].to_string())
}
