//! Embedding generation with a two-tier cache.
//!
//! [`EmbeddingProvider`] fronts an [`EmbeddingBackend`] (HTTP implementation
//! included) with a fast in-memory TTL tier and an optional durable tier.
//! Durable-tier hits are promoted into the fast tier on read, so the two
//! tiers converge without explicit synchronisation.

mod backend;
mod cache;
mod error;
mod provider;
mod retry;

pub use backend::{EmbeddingBackend, HttpEmbeddingBackend};
pub use cache::{normalize_text, DurableEmbeddingCache, FastCache};
pub use error::EmbedError;
pub use provider::{cosine_similarity, EmbeddingProvider};
