//! multisearch: fan one query out to several search providers at once
//!
//! Each selected provider runs concurrently and reports exactly one outcome,
//! delivered as soon as it completes. Text mode yields snippets; image mode
//! yields decoded images. A failing provider degrades to its own fallback and
//! never affects the others.

pub mod config;
pub mod error;
pub mod images;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod search;

pub use config::Settings;
pub use error::SearchError;
pub use images::{FetchedImage, ImageFetcher};
pub use network::HttpClient;
pub use search::{Aggregator, Mode, OutcomeResults, ProviderId, ProviderOutcome, Query, SearchRun};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for provider requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Maximum timeout that can be set
pub const MAX_TIMEOUT: u64 = 30;
