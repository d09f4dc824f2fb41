//! Registry for provider adapter plugins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{
    ArxivProvider, CrossRefProvider, OpenAlexProvider, ProviderAdapter, RateBudget,
    SemanticScholarProvider,
};
use crate::config::ProvidersConfig;
use crate::models::ProviderId;
use crate::utils::HttpClient;

/// Registry of enabled provider adapters
///
/// Built once from config at startup; the aggregator fans out over `all()`.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Create a registry with the providers enabled in config
    pub fn from_config(config: &ProvidersConfig, min_citations: u32) -> Self {
        let client = HttpClient::with_timeout(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            Duration::from_secs(config.timeout_secs),
        );
        let wait = Duration::from_millis(config.rate_wait_ms);
        let mut registry = Self {
            providers: HashMap::new(),
        };

        if config.arxiv.enabled {
            registry.register(Arc::new(ArxivProvider::new(
                client.clone(),
                Arc::new(RateBudget::per_second(config.arxiv.requests_per_second, wait)),
            )));
        }
        if config.crossref.enabled {
            registry.register(Arc::new(CrossRefProvider::new(
                client.clone(),
                Arc::new(RateBudget::per_second(config.crossref.requests_per_second, wait)),
            )));
        }
        if config.openalex.enabled {
            registry.register(Arc::new(OpenAlexProvider::new(
                client.clone(),
                Arc::new(RateBudget::per_second(config.openalex.requests_per_second, wait)),
                config.contact_email.clone(),
                min_citations,
            )));
        }
        if config.semantic.enabled {
            registry.register(Arc::new(SemanticScholarProvider::new(
                client,
                Arc::new(RateBudget::per_second(config.semantic.requests_per_second, wait)),
                config.semantic.api_key.clone(),
            )));
        }

        registry
    }

    /// Empty registry; providers are added with `register`
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register an adapter
    pub fn register(&mut self, provider: Arc<dyn ProviderAdapter>) {
        self.providers
            .insert(provider.id().id().to_string(), provider);
    }

    /// Get a provider by ID
    pub fn get(&self, id: &ProviderId) -> Option<&Arc<dyn ProviderAdapter>> {
        self.providers.get(id.id())
    }

    /// All registered providers
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn ProviderAdapter>> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
