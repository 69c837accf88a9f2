use thiserror::Error;

/// Errors from the embedding backend and its caches.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("embedding backend returned status {0}")]
    Status(reqwest::StatusCode),

    /// The response body could not be deserialized.
    #[error("embedding response parse error: {0}")]
    Parse(String),

    /// The backend returned a different number of vectors than inputs.
    #[error("embedding backend returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    /// Durable-tier read/write failure.
    #[error("durable cache error: {0}")]
    DurableCache(String),
}
