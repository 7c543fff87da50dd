//! Provider traits and types

use crate::error::{Result, SearchError};
use crate::network::HttpClient;
use crate::search::{ProviderId, Query};
use async_trait::async_trait;
use url::Url;

/// Text-search capability of a provider
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider this adapter speaks for
    fn id(&self) -> ProviderId;

    /// Short description of the backend
    fn about(&self) -> ProviderAbout {
        ProviderAbout::default()
    }

    /// Default time budget in seconds for one search
    fn timeout(&self) -> f64 {
        crate::DEFAULT_TIMEOUT as f64
    }

    /// Run the provider protocol and return snippets in provider order
    async fn search(&self, client: &HttpClient, query: &Query) -> Result<Vec<String>>;

    /// Results shown in place of a failed search
    fn fallback(&self, _error: &SearchError) -> Vec<String> {
        vec![format!("Error while searching {}.", self.id())]
    }
}

/// Image-search capability of a provider
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Provider this adapter speaks for
    fn id(&self) -> ProviderId;

    /// Short description of the backend
    fn about(&self) -> ProviderAbout {
        ProviderAbout::default()
    }

    /// Default time budget in seconds for one search
    fn timeout(&self) -> f64 {
        crate::DEFAULT_TIMEOUT as f64
    }

    /// Run the provider protocol and return image URLs in provider order
    async fn search(&self, client: &HttpClient, query: &Query) -> Result<Vec<Url>>;

    /// Results used in place of a failed search. Image failures stay silent.
    fn fallback(&self, _error: &SearchError) -> Vec<Url> {
        Vec::new()
    }
}

/// Provider metadata
#[derive(Debug, Clone, Default)]
pub struct ProviderAbout {
    /// Website URL
    pub website: Option<String>,
    /// Whether it uses the official API
    pub use_official_api: bool,
    /// Whether an API key is required
    pub require_api_key: bool,
    /// Result format (HTML, JSON)
    pub results: String,
}

impl ProviderAbout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn official_api(mut self, uses: bool) -> Self {
        self.use_official_api = uses;
        self
    }

    pub fn api_key_required(mut self, required: bool) -> Self {
        self.require_api_key = required;
        self
    }

    pub fn results_format(mut self, format: impl Into<String>) -> Self {
        self.results = format.into();
        self
    }
}
