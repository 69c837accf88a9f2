//! Content matching and lead scoring.
//!
//! [`KeywordMatcher`] finds exact keyword hits with an Aho-Corasick
//! automaton, [`KeywordEmbeddingIndex`] holds per-keyword vectors for
//! semantic comparison, and [`SemanticMatchEngine`] combines the two into a
//! unified match decision. [`scorer`] turns a match into qualification and
//! numeric scores.

mod engine;
mod error;
mod index;
mod keyword;
pub mod scorer;

pub use engine::SemanticMatchEngine;
pub use error::MatchError;
pub use index::KeywordEmbeddingIndex;
pub use keyword::KeywordMatcher;
