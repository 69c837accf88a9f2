//! Platform → content-source registry.

use std::collections::HashMap;
use std::sync::Arc;

use leadscout_core::{ContentSource, Platform};

/// Maps each platform to its content source.
///
/// Composition replaces the source's scraper inheritance hierarchy: a
/// platform without a registered source is simply skipped by the pipeline.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<Platform, Arc<dyn ContentSource>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its own platform, replacing any previous
    /// registration for that platform.
    pub fn register(&mut self, source: Arc<dyn ContentSource>) {
        self.sources.insert(source.platform(), source);
    }

    #[must_use]
    pub fn get(&self, platform: Platform) -> Option<&Arc<dyn ContentSource>> {
        self.sources.get(&platform)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
