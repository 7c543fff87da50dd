//! Settings structures for multisearch configuration

use crate::error::SearchError;
use crate::search::{Mode, ProviderId};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub providers: Vec<ProviderConfig>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (MULTISEARCH_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge overrides from an arbitrary variable source
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("MULTISEARCH_DEBUG") {
            match val.parse() {
                Ok(debug) => self.general.debug = debug,
                Err(_) => warn!("Ignoring invalid MULTISEARCH_DEBUG: {}", val),
            }
        }
        if let Some(val) = lookup("MULTISEARCH_TIMEOUT") {
            match val.parse() {
                Ok(timeout) => self.outgoing.request_timeout = timeout,
                Err(_) => warn!("Ignoring invalid MULTISEARCH_TIMEOUT: {}", val),
            }
        }
        if let Some(val) = lookup("MULTISEARCH_PROVIDERS") {
            match ProviderId::parse_list(&val) {
                Ok(providers) => self.search.default_providers = providers,
                Err(e) => warn!("Ignoring MULTISEARCH_PROVIDERS: {}", e),
            }
        }
    }

    /// Check values that would make every run fail
    pub fn validate(&self) -> std::result::Result<(), SearchError> {
        if self.outgoing.request_timeout <= 0.0 {
            return Err(SearchError::Config(
                "outgoing.request_timeout must be > 0".into(),
            ));
        }
        if self.outgoing.max_request_timeout <= 0.0 {
            return Err(SearchError::Config(
                "outgoing.max_request_timeout must be > 0".into(),
            ));
        }
        if self.search.image_concurrency == 0 {
            return Err(SearchError::Config(
                "search.image_concurrency must be > 0".into(),
            ));
        }
        for provider in &self.providers {
            if let Some(timeout) = provider.timeout {
                if !timeout.is_finite() || timeout <= 0.0 {
                    return Err(SearchError::Config(format!(
                        "providers.{}.timeout must be a positive number of seconds",
                        provider.name.key()
                    )));
                }
            }
        }
        if self.search.default_providers.is_empty() {
            return Err(SearchError::Config(
                "search.default_providers must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Get provider config by id
    pub fn get_provider(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == id)
    }

    /// Providers that are configured and not disabled
    pub fn enabled_providers(&self) -> Vec<&ProviderConfig> {
        self.providers.iter().filter(|p| !p.disabled).collect()
    }
}

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Mode used when the caller does not pick one
    pub default_mode: Mode,
    /// Providers used when the caller does not pick any
    pub default_providers: Vec<ProviderId>,
    /// Image downloads in flight per provider (1 = strictly sequential)
    pub image_concurrency: usize,
    /// Largest image body accepted for decoding
    pub max_image_bytes: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_mode: Mode::Text,
            default_providers: ProviderId::ALL.to_vec(),
            image_concurrency: 4,
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Per-request timeout in seconds
    pub request_timeout: f64,
    /// Upper bound for any provider's time budget
    pub max_request_timeout: f64,
    /// User agent string (none = random)
    pub useragent: Option<String>,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT as f64,
            max_request_timeout: crate::MAX_TIMEOUT as f64,
            useragent: None,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider this entry configures
    pub name: ProviderId,
    /// Whether the provider is left out of the registry
    pub disabled: bool,
    /// Time budget for one provider unit, in seconds
    pub timeout: Option<f64>,
    /// Override for the text endpoint
    pub text_url: Option<String>,
    /// Override for the image endpoint
    pub images_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: ProviderId::DuckDuckGo,
            disabled: false,
            timeout: None,
            text_url: None,
            images_url: None,
        }
    }
}

impl ProviderConfig {
    pub fn new(name: ProviderId) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.search.default_mode, Mode::Text);
        assert_eq!(settings.search.default_providers.len(), 3);
        assert_eq!(settings.outgoing.request_timeout, 5.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
search:
  default_mode: images
  default_providers: [duckduckgo, google]
  image_concurrency: 1
outgoing:
  request_timeout: 2.5
providers:
  - name: duckduckgo
    text_url: http://127.0.0.1:9000/
  - name: bing
    disabled: true
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.search.default_mode, Mode::Images);
        assert_eq!(
            settings.search.default_providers,
            vec![ProviderId::DuckDuckGo, ProviderId::Google]
        );
        assert_eq!(settings.search.image_concurrency, 1);
        assert_eq!(settings.search.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.outgoing.request_timeout, 2.5);
        assert_eq!(settings.outgoing.max_request_timeout, 30.0);

        let ddg = settings.get_provider(ProviderId::DuckDuckGo).unwrap();
        assert_eq!(ddg.text_url.as_deref(), Some("http://127.0.0.1:9000/"));
        assert_eq!(settings.enabled_providers().len(), 1);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let yaml = "providers:\n  - name: altavista\n";
        assert!(Settings::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_merge_vars() {
        let mut settings = Settings::default();
        settings.merge_vars(|key| match key {
            "MULTISEARCH_DEBUG" => Some("true".to_string()),
            "MULTISEARCH_TIMEOUT" => Some("nope".to_string()),
            "MULTISEARCH_PROVIDERS" => Some("ddg, Bing".to_string()),
            _ => None,
        });

        assert!(settings.general.debug);
        assert_eq!(settings.outgoing.request_timeout, 5.0);
        assert_eq!(
            settings.search.default_providers,
            vec![ProviderId::DuckDuckGo, ProviderId::Bing]
        );
    }

    #[test]
    fn test_validate() {
        let mut settings = Settings::default();
        settings.search.image_concurrency = 0;
        assert!(matches!(settings.validate(), Err(SearchError::Config(_))));

        let mut settings = Settings::default();
        settings.search.default_providers.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.outgoing.request_timeout = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_provider_timeouts() {
        for timeout in [f64::INFINITY, f64::NAN, 0.0, -3.0] {
            let mut settings = Settings::default();
            settings.providers = vec![ProviderConfig {
                timeout: Some(timeout),
                ..ProviderConfig::new(ProviderId::Bing)
            }];
            assert!(matches!(settings.validate(), Err(SearchError::Config(_))));
        }

        let settings = Settings::from_yaml("providers:\n  - name: bing\n    timeout: .inf\n").unwrap();
        assert!(settings.validate().is_err());

        let settings = Settings::from_yaml("providers:\n  - name: bing\n    timeout: 2.5\n").unwrap();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_debug_override_is_ignored() {
        let mut settings = Settings::default();
        settings.general.debug = true;
        settings.merge_vars(|key| match key {
            "MULTISEARCH_DEBUG" => Some("maybe".to_string()),
            _ => None,
        });
        assert!(settings.general.debug);

        settings.merge_vars(|key| match key {
            "MULTISEARCH_DEBUG" => Some("false".to_string()),
            _ => None,
        });
        assert!(!settings.general.debug);
    }
}
