//! Exact multi-pattern keyword matching with exclusion filtering.

use std::collections::HashSet;

use aho_corasick::AhoCorasick;

use crate::error::MatchError;

/// Case-insensitive substring matcher over a fixed keyword set.
///
/// Both automata are built once at construction, so scanning many content
/// items against the same agent configuration is sub-linear in keyword
/// count per scan. Matching is plain substring matching, not
/// word-boundary-aware.
pub struct KeywordMatcher {
    /// Lowercased keywords, indexed by automaton pattern id.
    keywords: Vec<String>,
    automaton: AhoCorasick,
    /// `None` when the agent has no excluded keywords.
    exclusions: Option<AhoCorasick>,
}

impl KeywordMatcher {
    /// Build a matcher from keyword and excluded-keyword sets. Blank
    /// entries are dropped; casing is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Pattern`] if automaton construction fails.
    pub fn new(keywords: &[String], excluded: &[String]) -> Result<Self, MatchError> {
        let keywords = normalize_patterns(keywords);
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&keywords)
            .map_err(|e| MatchError::Pattern(e.to_string()))?;

        let excluded = normalize_patterns(excluded);
        let exclusions = if excluded.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .ascii_case_insensitive(true)
                    .build(&excluded)
                    .map_err(|e| MatchError::Pattern(e.to_string()))?,
            )
        };

        Ok(Self {
            keywords,
            automaton,
            exclusions,
        })
    }

    /// Keywords found in `text`, deduplicated, in first-occurrence order.
    ///
    /// If any excluded keyword appears anywhere in the text, the whole item
    /// is rejected and the result is empty — exclusion is all-or-nothing,
    /// not per-keyword. An empty result is a non-match, not an error.
    #[must_use]
    pub fn find_exact_matches(&self, text: &str) -> Vec<String> {
        if let Some(exclusions) = &self.exclusions {
            if exclusions.is_match(text) {
                return Vec::new();
            }
        }

        let mut seen: HashSet<usize> = HashSet::new();
        let mut matches = Vec::new();
        for found in self.automaton.find_overlapping_iter(text) {
            let id = found.pattern().as_usize();
            if seen.insert(id) {
                matches.push(self.keywords[id].clone());
            }
        }
        matches
    }
}

fn normalize_patterns(patterns: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.clone()))
        .collect()
}
