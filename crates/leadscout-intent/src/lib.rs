//! Buying-intent classification via an external language model.
//!
//! A single LLM call per invocation, no local fallback model. Failures of
//! any kind — transport, quota, malformed output — degrade to the neutral
//! signal (`{neutral, 0.5, "error"}`) instead of propagating, so a broken
//! classifier can never abort the pipeline.

mod backend;
mod classifier;
mod error;
mod parse;
mod retry;

pub use backend::{HttpLlmBackend, LlmBackend};
pub use classifier::IntentClassifier;
pub use error::IntentError;
pub use parse::extract_json;
