use thiserror::Error;

/// Errors from the language-model backend. These never escape
/// [`crate::IntentClassifier::classify`] — they exist so the retry layer
/// can tell transient failures from permanent ones.
#[derive(Debug, Error)]
pub enum IntentError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("intent backend returned status {0}")]
    Status(reqwest::StatusCode),

    /// The completion payload was missing or not valid JSON.
    #[error("malformed intent response: {0}")]
    Malformed(String),
}
