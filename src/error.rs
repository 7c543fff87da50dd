//! Error types for search runs
//!
//! Only `InvalidInput` and `Config` ever reach a caller. Every other variant is
//! absorbed inside the provider or image unit that produced it.

/// Errors raised while searching
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Empty query or empty provider selection
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network, DNS or HTTP status failure talking to a provider
    #[error("transport error: {0}")]
    Transport(String),

    /// Unexpected payload from a provider (bad JSON, missing fields or markers)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Provider exceeded its time budget
    #[error("timed out: {0}")]
    Timeout(String),

    /// Download or decode failure for a single image
    #[error("image fetch error: {0}")]
    ImageFetch(String),

    /// Invalid settings or client construction failure
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SearchError::InvalidInput("no providers selected".into());
        assert_eq!(err.to_string(), "invalid input: no providers selected");

        let err = SearchError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn test_json_error_is_protocol() {
        let err: SearchError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, SearchError::Protocol(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
