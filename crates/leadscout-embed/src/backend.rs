//! Embedding backend trait and the TEI-style HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::EmbedError;
use crate::retry::retry_with_backoff;

/// Maximum number of texts per `/embed` request.
const BATCH_SIZE: usize = 64;

/// Computes embedding vectors for text. Implementations must be safe to
/// share across concurrent pipeline workers.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embed many texts, returning one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: Vec<&'a str>,
}

/// HTTP client for a TEI-style embedding server (`POST /embed`).
pub struct HttpEmbeddingBackend {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpEmbeddingBackend {
    /// Create a new backend client for `embed_url`.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::Http`] if the HTTP client cannot be built.
    pub fn new(
        embed_url: &str,
        request_timeout: Duration,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, EmbedError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/embed", embed_url.trim_end_matches('/')),
            max_retries,
            backoff_base_ms,
        })
    }

    /// One `/embed` round-trip for up to [`BATCH_SIZE`] texts.
    async fn embed_chunk(&self, chunk: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let request = EmbedRequest {
            inputs: chunk.to_vec(),
        };
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::Status(status));
        }

        let embeddings: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| EmbedError::Parse(e.to_string()))?;

        if embeddings.len() != chunk.len() {
            return Err(EmbedError::CountMismatch {
                expected: chunk.len(),
                got: embeddings.len(),
            });
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let chunk = [text];
        let mut vectors = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.embed_chunk(&chunk)
        })
        .await?;
        vectors.pop().ok_or(EmbedError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let vectors = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                self.embed_chunk(&refs)
            })
            .await?;
            all.extend(vectors);
        }
        Ok(all)
    }
}
