//! Trait definition for pluggable catalog provider backends.
//!
//! Each provider (Real-Time Amazon Data, Canopy) implements
//! [`CatalogProvider`] to give the client a uniform way to run a product
//! search and decode the provider's JSON into [`Product`] values.

use crate::error::CatalogError;
use crate::types::Product;

/// One product search as handed to a provider.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams<'a> {
    /// Resolved search query.
    pub query: &'a str,
    /// Maximum number of products wanted.
    pub limit: usize,
    /// Marketplace identifier, e.g. `"US"` or `"UK"`.
    pub marketplace_id: &'a str,
    /// Marketplace domain, e.g. `"amazon.co.uk"`.
    pub marketplace_domain: &'a str,
}

/// A pluggable catalog provider backend.
///
/// Implementors handle their own URL construction, authentication headers,
/// and response decoding. All implementations must be `Send + Sync`.
pub trait CatalogProvider: Send + Sync {
    /// Run a product search and return decoded products in provider order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if credentials are missing, the HTTP request
    /// fails, the provider reports an error, or the body cannot be decoded.
    fn search(
        &self,
        params: &SearchParams<'_>,
    ) -> impl std::future::Future<Output = Result<Vec<Product>, CatalogError>> + Send;
}
