//! DuckDuckGo provider implementation
//!
//! Text results come from the public Instant Answer API. Image results need two
//! requests: the HTML search page carries a short-lived `vqd` token that the JSON
//! image endpoint requires.

use super::traits::*;
use crate::error::Result;
use crate::network::{accept_json, HttpClient, ProviderRequest};
use crate::search::{ProviderId, Query};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

const API_URL: &str = "https://api.duckduckgo.com/";
const SITE_URL: &str = "https://duckduckgo.com/";

/// Marker preceding the session token in the image search page
const VQD_MARKER: &str = "vqd='";

/// DuckDuckGo Instant Answer text search
pub struct DuckDuckGo {
    api_url: String,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self {
            api_url: API_URL.to_string(),
        }
    }

    /// Point the adapter at another Instant Answer endpoint
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            api_url: url.into(),
        }
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextProvider for DuckDuckGo {
    fn id(&self) -> ProviderId {
        ProviderId::DuckDuckGo
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://duckduckgo.com")
            .official_api(true)
            .results_format("JSON")
    }

    async fn search(&self, client: &HttpClient, query: &Query) -> Result<Vec<String>> {
        let request = ProviderRequest::get(&self.api_url)
            .header("Accept", accept_json())
            .param("q", query.as_str())
            .param("format", "json")
            .param("no_redirect", "1")
            .param("no_html", "1");

        let response = client.execute(request).await?.error_for_status()?;
        parse_instant_answer(&response.text)
    }
}

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
    #[serde(rename = "AbstractText", default)]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text")]
    text: Option<String>,
}

/// Extract snippets from an Instant Answer payload
///
/// Every `RelatedTopics[].Text` in order; if there are none, the non-empty
/// `AbstractText` alone; otherwise nothing.
pub fn parse_instant_answer(json: &str) -> Result<Vec<String>> {
    let answer: InstantAnswer = serde_json::from_str(json)?;

    let mut results: Vec<String> = answer
        .related_topics
        .into_iter()
        .filter_map(|topic| topic.text)
        .collect();

    if results.is_empty() {
        if let Some(abstract_text) = answer.abstract_text.filter(|t| !t.is_empty()) {
            results.push(abstract_text);
        }
    }

    Ok(results)
}

/// DuckDuckGo image search (token scrape, then JSON query)
pub struct DuckDuckGoImages {
    site_url: String,
}

impl DuckDuckGoImages {
    pub fn new() -> Self {
        Self {
            site_url: SITE_URL.to_string(),
        }
    }

    /// Point the adapter at another site root; `i.js` is resolved against it
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            site_url: url.into(),
        }
    }

    fn images_api_url(&self) -> String {
        format!("{}/i.js", self.site_url.trim_end_matches('/'))
    }

    async fn fetch_token(&self, client: &HttpClient, query: &Query) -> Result<Option<String>> {
        let request = ProviderRequest::get(&self.site_url)
            .param("q", query.as_str())
            .param("iax", "images")
            .param("ia", "images");

        let response = client.execute(request).await?.error_for_status()?;
        Ok(extract_vqd_token(&response.text).map(str::to_string))
    }
}

impl Default for DuckDuckGoImages {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProvider for DuckDuckGoImages {
    fn id(&self) -> ProviderId {
        ProviderId::DuckDuckGo
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://duckduckgo.com/?ia=images")
            .official_api(false)
            .results_format("JSON")
    }

    // two sequential requests
    fn timeout(&self) -> f64 {
        2.0 * crate::DEFAULT_TIMEOUT as f64
    }

    async fn search(&self, client: &HttpClient, query: &Query) -> Result<Vec<Url>> {
        let token = match self.fetch_token(client, query).await? {
            Some(token) => token,
            None => {
                debug!("No vqd token in DuckDuckGo image page for '{}'", query);
                return Ok(Vec::new());
            }
        };

        let request = ProviderRequest::get(self.images_api_url())
            .header("Accept", accept_json())
            .header("Referer", self.site_url.as_str())
            .param("l", "us-en")
            .param("o", "json")
            .param("q", query.as_str())
            .param("vqd", token);

        let response = client.execute(request).await?.error_for_status()?;
        parse_image_results(&response.text)
    }
}

#[derive(Debug, Deserialize)]
struct ImageResults {
    #[serde(default)]
    results: Vec<ImageHit>,
}

#[derive(Debug, Deserialize)]
struct ImageHit {
    image: Option<String>,
}

/// Extract `results[].image` URLs in order, skipping entries that are not absolute URLs
pub fn parse_image_results(json: &str) -> Result<Vec<Url>> {
    let payload: ImageResults = serde_json::from_str(json)?;

    Ok(payload
        .results
        .into_iter()
        .filter_map(|hit| hit.image)
        .filter_map(|image| match Url::parse(&image) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("Skipping image URL {:?}: {}", image, e);
                None
            }
        })
        .collect())
}

/// Find the `vqd` session token in a DuckDuckGo search page
///
/// Takes the first `vqd='` and returns everything up to the next single quote.
/// Returns `None` when the marker or the closing quote is missing.
pub fn extract_vqd_token(html: &str) -> Option<&str> {
    let start = html.find(VQD_MARKER)? + VQD_MARKER.len();
    let len = html[start..].find('\'')?;
    Some(&html[start..start + len])
}
