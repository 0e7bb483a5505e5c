//! Error types for the storefront.

use storefront_catalog::CatalogError;

/// Top-level error type for the storefront service.
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    /// Configuration or taxonomy data is missing or invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Catalog client construction or search error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Geolocation lookup error.
    #[error("geolocation error: {0}")]
    Geolocation(String),

    /// Unknown marketplace id or invalid marketplace data.
    #[error("marketplace error: {0}")]
    Marketplace(String),

    /// HTTP server error (bind, serve).
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, StorefrontError>;
