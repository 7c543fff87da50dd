//! Bing provider
//!
//! The Bing Web Search API needs a subscription key, so both capabilities are
//! placeholders that never touch the network.

use super::traits::*;
use crate::error::Result;
use crate::network::HttpClient;
use crate::search::{ProviderId, Query};
use async_trait::async_trait;
use url::Url;

/// Message returned in place of Bing text results
pub const KEY_REQUIRED: &str = "Bing Search API requires a key.";

fn about() -> ProviderAbout {
    ProviderAbout::new()
        .website("https://www.bing.com")
        .official_api(true)
        .api_key_required(true)
        .results_format("JSON")
}

/// Bing text search placeholder
#[derive(Debug, Default)]
pub struct Bing;

impl Bing {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextProvider for Bing {
    fn id(&self) -> ProviderId {
        ProviderId::Bing
    }

    fn about(&self) -> ProviderAbout {
        about()
    }

    async fn search(&self, _client: &HttpClient, _query: &Query) -> Result<Vec<String>> {
        Ok(vec![KEY_REQUIRED.to_string()])
    }
}

/// Bing image search placeholder
#[derive(Debug, Default)]
pub struct BingImages;

impl BingImages {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageProvider for BingImages {
    fn id(&self) -> ProviderId {
        ProviderId::Bing
    }

    fn about(&self) -> ProviderAbout {
        about()
    }

    async fn search(&self, _client: &HttpClient, _query: &Query) -> Result<Vec<Url>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bing_placeholders() {
        let client = HttpClient::new().unwrap();
        let query = Query::new("rust").unwrap();

        let text = Bing::new().search(&client, &query).await.unwrap();
        assert_eq!(text, vec![KEY_REQUIRED.to_string()]);

        let images = BingImages::new().search(&client, &query).await.unwrap();
        assert!(images.is_empty());

        assert!(TextProvider::about(&Bing).require_api_key);
    }
}
