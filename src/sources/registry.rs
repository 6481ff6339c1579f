//! Registry for managing search sources.

use std::sync::Arc;

use super::{CrossRefSource, GoogleScholarSource, SemanticScholarSource, Source, SourceError};
use crate::config::Config;
use crate::utils::HttpClient;

/// Registry of search sources
///
/// Sources are kept in registration order, which is also the order the sweep
/// calls them in.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the default sources from configuration, skipping disabled ones
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::from_config(&config.http)?;
        let mut registry = Self::new();

        registry.register(Arc::new(GoogleScholarSource::from_config(client.clone(), config)));
        registry.register(Arc::new(CrossRefSource::from_config(client.clone(), config)));
        registry.register(Arc::new(SemanticScholarSource::from_config(client, config)));

        registry.retain(|id| config.sources.is_enabled(id));

        tracing::debug!(sources = ?registry.ids().collect::<Vec<_>>(), "Sources registered");
        Ok(registry)
    }

    /// Register a new source; a source with the same id is replaced in place
    pub fn register(&mut self, source: Arc<dyn Source>) {
        match self.sources.iter_mut().find(|s| s.id() == source.id()) {
            Some(existing) => *existing = source,
            None => self.sources.push(source),
        }
    }

    /// Keep only sources whose id satisfies the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.sources.retain(|s| keep(s.id()));
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// All registered sources, in call order
    pub fn all(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    /// Get all source IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
