//! Search query and related data models

use crate::error::SearchError;
use crate::images::FetchedImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trimmed, non-empty search query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// Trim `text` and reject it if nothing is left
    pub fn new(text: impl AsRef<str>) -> Result<Self, SearchError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidInput(
                "search query must not be empty".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Query {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Which adapter capability a run invokes on every provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Text,
    #[serde(alias = "image")]
    Images,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Images => write!(f, "images"),
        }
    }
}

/// Known search providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[serde(alias = "ddg")]
    DuckDuckGo,
    Bing,
    Google,
}

impl ProviderId {
    /// Every provider, in display order
    pub const ALL: [ProviderId; 3] = [Self::DuckDuckGo, Self::Bing, Self::Google];

    /// Stable lowercase key used in settings and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "duckduckgo",
            Self::Bing => "bing",
            Self::Google => "google",
        }
    }

    /// Parse a comma-separated provider list, e.g. `"ddg,bing"`
    pub fn parse_list(list: &str) -> Result<Vec<Self>, SearchError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<Self>)
            .collect()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuckDuckGo => write!(f, "DuckDuckGo"),
            Self::Bing => write!(f, "Bing"),
            Self::Google => write!(f, "Google"),
        }
    }
}

impl FromStr for ProviderId {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "duckduckgo" | "ddg" => Ok(Self::DuckDuckGo),
            "bing" => Ok(Self::Bing),
            "google" => Ok(Self::Google),
            other => Err(SearchError::InvalidInput(format!(
                "unknown provider: {}",
                other
            ))),
        }
    }
}

/// Results carried by one provider outcome
#[derive(Debug, Clone)]
pub enum OutcomeResults {
    /// Text snippets in provider order, possibly a single failure placeholder
    Text(Vec<String>),
    /// Images that downloaded and decoded, in provider order
    Images(Vec<FetchedImage>),
}

impl OutcomeResults {
    /// Empty results for `mode`
    pub fn empty(mode: Mode) -> Self {
        match mode {
            Mode::Text => Self::Text(Vec::new()),
            Mode::Images => Self::Images(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Text(items) => items.len(),
            Self::Images(images) => images.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Text(_) => Mode::Text,
            Self::Images(_) => Mode::Images,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Self::Text(items) => Some(items),
            Self::Images(_) => None,
        }
    }

    pub fn as_images(&self) -> Option<&[FetchedImage]> {
        match self {
            Self::Images(images) => Some(images),
            Self::Text(_) => None,
        }
    }
}

/// One provider's results, delivered to the presentation layer as it completes
#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    pub provider: ProviderId,
    pub results: OutcomeResults,
}

impl ProviderOutcome {
    pub fn new(provider: ProviderId, results: OutcomeResults) -> Self {
        Self { provider, results }
    }

    pub fn text(provider: ProviderId, items: Vec<String>) -> Self {
        Self::new(provider, OutcomeResults::Text(items))
    }

    pub fn images(provider: ProviderId, images: Vec<FetchedImage>) -> Self {
        Self::new(provider, OutcomeResults::Images(images))
    }
}
