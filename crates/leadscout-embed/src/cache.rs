//! Cache tiers and key derivation for embeddings.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use leadscout_core::Platform;

use crate::error::EmbedError;

/// Normalize text before keying and before backend calls, so semantically
/// identical inputs with different casing/whitespace share a cache entry.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Cache key for ad hoc text: SHA-256 of the normalized text.
pub(crate) fn text_key(normalized: &str) -> String {
    let hash = Sha256::digest(normalized.as_bytes());
    format!("text:{hash:x}")
}

/// Cache key for content-item embeddings in the fast tier.
pub(crate) fn post_key(platform: Platform, post_id: &str) -> String {
    format!("post:{platform}:{post_id}")
}

struct FastEntry {
    vector: Vec<f32>,
    inserted_at: Instant,
}

/// Fast in-memory tier with per-entry TTL.
///
/// Concurrent misses racing to compute the same embedding are tolerated;
/// last write wins on the key, and values for a key are identical.
pub struct FastCache {
    entries: RwLock<HashMap<String, FastEntry>>,
    ttl: Duration,
}

impl FastCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a live entry; expired entries are dropped on access.
    pub async fn get(&self, key: &str) -> Option<Vec<f32>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(entry.vector.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but is expired — evict it.
        self.entries.write().await.remove(key);
        None
    }

    pub async fn insert(&self, key: String, vector: Vec<f32>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            FastEntry {
                vector,
                inserted_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Durable second tier, keyed by `(post_id, platform)`.
///
/// This is deliberately a narrow compute-free interface: the cache never
/// holds a reference back to the provider, so there is no constructor
/// cycle between the two.
#[async_trait]
pub trait DurableEmbeddingCache: Send + Sync {
    async fn get(
        &self,
        post_id: &str,
        platform: Platform,
    ) -> Result<Option<Vec<f32>>, EmbedError>;

    async fn put(
        &self,
        post_id: &str,
        platform: Platform,
        embedding: &[f32],
    ) -> Result<(), EmbedError>;
}
