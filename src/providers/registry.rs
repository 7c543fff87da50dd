//! Provider registry indexed by (provider, mode)

use super::traits::{ImageProvider, TextProvider};
use crate::search::{Mode, ProviderId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Registry of the adapters available for each provider and mode
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    text: HashMap<ProviderId, Arc<dyn TextProvider>>,
    images: HashMap<ProviderId, Arc<dyn ImageProvider>>,
    /// Configured time budgets, overriding the adapters' defaults
    timeouts: HashMap<ProviderId, f64>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a text adapter, replacing any previous one for the same provider
    pub fn register_text(&mut self, adapter: Arc<dyn TextProvider>) {
        self.text.insert(adapter.id(), adapter);
    }

    /// Register an image adapter, replacing any previous one for the same provider
    pub fn register_images(&mut self, adapter: Arc<dyn ImageProvider>) {
        self.images.insert(adapter.id(), adapter);
    }

    /// Set a time budget in seconds for every capability of `provider`
    pub fn set_timeout(&mut self, provider: ProviderId, seconds: f64) {
        self.timeouts.insert(provider, seconds);
    }

    pub fn text(&self, provider: ProviderId) -> Option<Arc<dyn TextProvider>> {
        self.text.get(&provider).cloned()
    }

    pub fn images(&self, provider: ProviderId) -> Option<Arc<dyn ImageProvider>> {
        self.images.get(&provider).cloned()
    }

    /// Check if `provider` has an adapter for `mode`
    pub fn supports(&self, provider: ProviderId, mode: Mode) -> bool {
        match mode {
            Mode::Text => self.text.contains_key(&provider),
            Mode::Images => self.images.contains_key(&provider),
        }
    }

    /// Providers with an adapter for `mode`, in display order
    pub fn providers(&self, mode: Mode) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = match mode {
            Mode::Text => self.text.keys().copied().collect(),
            Mode::Images => self.images.keys().copied().collect(),
        };
        ids.sort();
        ids
    }

    /// Effective time budget for one provider unit, capped at `max`
    pub fn get_timeout(&self, provider: ProviderId, mode: Mode, max: Duration) -> Duration {
        let seconds = self
            .timeouts
            .get(&provider)
            .copied()
            .or_else(|| match mode {
                Mode::Text => self.text.get(&provider).map(|a| a.timeout()),
                Mode::Images => self.images.get(&provider).map(|a| a.timeout()),
            })
            .unwrap_or(crate::DEFAULT_TIMEOUT as f64);

        // NaN, negative and out-of-range budgets fall back to the cap
        Duration::try_from_secs_f64(seconds).map_or(max, |budget| budget.min(max))
    }

    /// Number of registered adapters across both modes
    pub fn len(&self) -> usize {
        self.text.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }
}
