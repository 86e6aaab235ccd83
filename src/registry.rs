use std::collections::HashMap;

use crate::apis::{EDreamsFactory, RyanairFactory};
use crate::common::error::{Result, ScanError};
use crate::common::types::FlightProvider;
use crate::config::Config;

/// Knows how to bootstrap one provider adapter
#[async_trait::async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Display name, also the lookup key (case-insensitive)
    fn provider_name(&self) -> &'static str;

    /// Build the adapter and run its session bootstrap
    async fn connect(&self, config: &Config) -> Result<Box<dyn FlightProvider>>;
}

/// Registry of the flight providers the CLI can talk to
pub struct ProviderRegistry {
    factories: HashMap<String, Box<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create a registry holding the built-in providers
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(Box::new(EDreamsFactory));
        registry.register(Box::new(RyanairFactory));
        registry
    }

    /// Register a provider factory, replacing any with the same name
    pub fn register(&mut self, factory: Box<dyn ProviderFactory>) {
        self.factories
            .insert(factory.provider_name().to_lowercase(), factory);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ProviderFactory> {
        self.factories
            .get(&name.trim().to_lowercase())
            .map(|f| f.as_ref())
    }

    /// Display names of all registered providers, sorted
    pub fn list_providers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.values().map(|f| f.provider_name()).collect();
        names.sort_by_key(|name| name.to_lowercase());
        names
    }

    /// Connect to the named provider
    pub async fn connect(&self, name: &str, config: &Config) -> Result<Box<dyn FlightProvider>> {
        let factory = self
            .get(name)
            .ok_or_else(|| ScanError::UnknownProvider(name.to_string()))?;
        factory.connect(config).await
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
