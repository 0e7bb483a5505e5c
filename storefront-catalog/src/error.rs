//! Error types for the storefront-catalog crate.
//!
//! All errors use stable string messages suitable for logging and for
//! programmatic handling. API keys never appear in error messages.

/// Errors that can occur while searching the product catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Every attempted provider failed to return results.
    #[error("all catalog providers failed: {0}")]
    AllProvidersFailed(String),

    /// A provider request timed out.
    #[error("catalog request timed out: {0}")]
    Timeout(String),

    /// An HTTP request to a provider failed (connection, status code).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// A provider rejected the request (quota, auth, upstream error payload).
    #[error("provider error: {0}")]
    Provider(String),

    /// Invalid catalog configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Map a [`reqwest::Error`] raised while talking to `provider`.
    pub(crate) fn from_request(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(format!("{provider}: {err}"))
        } else if err.is_decode() {
            Self::Parse(format!("{provider} response decode failed: {err}"))
        } else {
            Self::Http(format!("{provider} request failed: {err}"))
        }
    }
}

/// Convenience type alias for storefront-catalog results.
pub type Result<T> = std::result::Result<T, CatalogError>;
