//! Provider loader for building the registry from configuration

use super::registry::ProviderRegistry;
use super::{bing, duckduckgo, google};
use crate::config::{ProviderConfig, Settings};
use crate::search::ProviderId;
use std::sync::Arc;
use tracing::info;

/// Loader for initializing providers from configuration
pub struct ProviderLoader;

impl ProviderLoader {
    /// Build a registry holding every provider that is not disabled
    ///
    /// Providers without a `providers:` entry are loaded with their defaults.
    pub fn load(settings: &Settings) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();

        for id in ProviderId::ALL {
            let config = settings
                .get_provider(id)
                .cloned()
                .unwrap_or_else(|| ProviderConfig::new(id));

            if config.disabled {
                info!("Skipping disabled provider: {}", id);
                continue;
            }

            Self::register(&mut registry, &config);
            info!("Loaded provider: {}", id);

            if registry
                .text(id)
                .map(|adapter| adapter.about().require_api_key)
                .unwrap_or(false)
            {
                info!("{} requires an API key; it will return a notice instead of results", id);
            }
        }

        info!("Loaded {} provider adapters", registry.len());
        registry
    }

    /// Registry with every built-in provider at its default endpoints
    pub fn defaults() -> ProviderRegistry {
        Self::load(&Settings::default())
    }

    fn register(registry: &mut ProviderRegistry, config: &ProviderConfig) {
        match config.name {
            ProviderId::DuckDuckGo => {
                let text = match config.text_url {
                    Some(ref url) => duckduckgo::DuckDuckGo::with_base_url(url),
                    None => duckduckgo::DuckDuckGo::new(),
                };
                let images = match config.images_url {
                    Some(ref url) => duckduckgo::DuckDuckGoImages::with_base_url(url),
                    None => duckduckgo::DuckDuckGoImages::new(),
                };
                registry.register_text(Arc::new(text));
                registry.register_images(Arc::new(images));
            }
            ProviderId::Bing => {
                registry.register_text(Arc::new(bing::Bing::new()));
                registry.register_images(Arc::new(bing::BingImages::new()));
            }
            ProviderId::Google => {
                registry.register_text(Arc::new(google::Google::new()));
                registry.register_images(Arc::new(google::GoogleImages::new()));
            }
        }

        if let Some(timeout) = config.timeout {
            registry.set_timeout(config.name, timeout);
        }
    }
}
