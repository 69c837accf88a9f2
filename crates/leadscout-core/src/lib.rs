//! Shared types, configuration, and collaborator traits for leadscout.
//!
//! The core pipeline is an internal library: scraping transport, job
//! scheduling, and notification delivery live behind the traits in
//! [`traits`], and the matching/scoring crates consume the domain types
//! defined in [`types`].

mod config;
mod traits;
mod types;

pub use config::{load_app_config, load_app_config_from_env, AppConfig, ConfigError};
pub use traits::{ContentSource, NotificationSink, SourceError, Storage, StorageError};
pub use types::{
    AgentConfig, AgentRunOutcome, ContentItem, Intent, IntentSignal, LeadRecord, MatchType,
    Platform, SemanticMatch,
};
