//! Image download and decoding
//!
//! Each URL is fetched and decoded on its own. A URL that fails to download or
//! decode is dropped without a placeholder, so callers simply see fewer images.

use crate::config::SearchSettings;
use crate::error::{Result, SearchError};
use crate::network::HttpClient;
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use tracing::debug;
use url::Url;

/// A decoded image together with the URL it came from
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub url: Url,
    pub image: DynamicImage,
}

impl FetchedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Downloads and decodes image URLs over the shared HTTP client
#[derive(Clone)]
pub struct ImageFetcher {
    client: HttpClient,
    concurrency: usize,
    max_bytes: usize,
}

impl ImageFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self::with_settings(client, &SearchSettings::default())
    }

    pub fn with_settings(client: HttpClient, settings: &SearchSettings) -> Self {
        Self {
            client,
            concurrency: settings.image_concurrency.max(1),
            max_bytes: settings.max_image_bytes,
        }
    }

    /// Set how many downloads may be in flight at once (1 = one at a time)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the largest body accepted for decoding
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Download and decode one image, reporting why it failed
    pub async fn try_fetch(&self, url: &Url) -> Result<FetchedImage> {
        let bytes = self
            .client
            .get_bytes(url.as_str(), self.max_bytes)
            .await
            .map_err(|e| SearchError::ImageFetch(e.to_string()))?;

        let image = tokio::task::spawn_blocking(move || decode(&bytes))
            .await
            .map_err(|e| SearchError::ImageFetch(format!("decode task failed: {}", e)))??;

        Ok(FetchedImage {
            url: url.clone(),
            image,
        })
    }

    /// Download and decode one image, or nothing if any step fails
    pub async fn fetch(&self, url: &Url) -> Option<FetchedImage> {
        match self.try_fetch(url).await {
            Ok(image) => Some(image),
            Err(e) => {
                debug!("Dropping image {}: {}", url, e);
                None
            }
        }
    }

    /// Fetch every URL, keeping input order among the images that succeed
    pub async fn fetch_all(&self, urls: Vec<Url>) -> Vec<FetchedImage> {
        stream::iter(urls)
            .map(|url| async move { self.fetch(&url).await })
            .buffered(self.concurrency)
            .filter_map(futures::future::ready)
            .collect()
            .await
    }
}

/// Decode an in-memory image, guessing the format from its contents
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| SearchError::ImageFetch(e.to_string()))
}
