use thiserror::Error;

use leadscout_embed::EmbedError;

/// Errors from matcher construction and content analysis.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The keyword automaton could not be built.
    #[error("pattern build error: {0}")]
    Pattern(String),

    /// Embedding the content or keywords failed after retries.
    #[error(transparent)]
    Embed(#[from] EmbedError),
}
