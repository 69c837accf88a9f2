//! Per-agent processing pipeline.
//!
//! Runs behind an external scheduler: fetch content for each of the agent's
//! platforms, dedupe against persisted history, score each remaining item
//! through the match engine, persist qualifying leads, and update usage
//! counters. Single-item failures are contained; only configuration-load
//! and aggregate storage-write failures escalate to the caller.

mod index_cache;
mod pipeline;
mod registry;

pub use pipeline::{AgentPipeline, PipelineError, PipelineSettings};
pub use registry::SourceRegistry;
