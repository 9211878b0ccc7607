use std::time::Duration;
use thiserror::Error;

/// Errors from a single provider call
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure from the HTTP client
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the provider
    #[error("{provider} returned HTTP {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Response body did not match the completion schema
    #[error("{provider} response malformed: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },

    /// Provider returned a completion with no content
    #[error("{provider} returned an empty completion")]
    Empty { provider: &'static str },

    /// A single attempt exceeded the call timeout
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn api(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            provider,
            status,
            message: message.into(),
        }
    }

    pub fn malformed(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            provider,
            message: message.into(),
        }
    }

    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed { .. } => false,
            Self::Empty { .. } => false,
            Self::Timeout(_) => true,
        }
    }

    /// Short stable code for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Http(_) => "http",
            Self::Api { .. } => "api",
            Self::Malformed { .. } => "malformed",
            Self::Empty { .. } => "empty",
            Self::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::api("openai", 429, "rate limited").is_retryable());
        assert!(ProviderError::api("openai", 500, "server error").is_retryable());
        assert!(ProviderError::api("openai", 503, "overloaded").is_retryable());
        assert!(!ProviderError::api("openai", 400, "bad request").is_retryable());
        assert!(!ProviderError::api("openai", 401, "bad key").is_retryable());
        assert!(!ProviderError::config("missing key").is_retryable());
        assert!(!ProviderError::malformed("openai", "no choices").is_retryable());
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ProviderError::config("x").code(), "config");
        assert_eq!(ProviderError::api("perplexity", 500, "x").code(), "api");
        assert_eq!(ProviderError::Timeout(Duration::from_secs(5)).code(), "timeout");
    }
}
