//! Google provider
//!
//! Custom Search needs an API key and a search engine id. Until those are
//! configurable both capabilities return fixed results without any I/O.

use super::traits::*;
use crate::error::Result;
use crate::network::HttpClient;
use crate::search::{ProviderId, Query};
use async_trait::async_trait;
use url::Url;

/// Message returned in place of Google text results
pub const KEY_REQUIRED: &str = "Google Custom Search API requires a key.";

fn about() -> ProviderAbout {
    ProviderAbout::new()
        .website("https://www.google.com")
        .official_api(true)
        .api_key_required(true)
        .results_format("JSON")
}

/// Google text search placeholder
#[derive(Debug, Default)]
pub struct Google;

impl Google {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextProvider for Google {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    fn about(&self) -> ProviderAbout {
        about()
    }

    async fn search(&self, _client: &HttpClient, _query: &Query) -> Result<Vec<String>> {
        Ok(vec![KEY_REQUIRED.to_string()])
    }
}

/// Google image search placeholder
#[derive(Debug, Default)]
pub struct GoogleImages;

impl GoogleImages {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageProvider for GoogleImages {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    fn about(&self) -> ProviderAbout {
        about()
    }

    async fn search(&self, _client: &HttpClient, _query: &Query) -> Result<Vec<Url>> {
        Ok(Vec::new())
    }
}
