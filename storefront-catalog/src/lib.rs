//! # storefront-catalog
//!
//! Product catalog search for the affiliate storefront.
//!
//! ## Design
//!
//! - Queries third-party product search APIs (Real-Time Amazon Data, Canopy)
//!   through a common [`CatalogProvider`] trait
//! - Providers are tried in priority order; the first non-empty page wins
//! - A per-provider circuit breaker skips providers that keep failing
//! - Usage counters per provider are exposed through
//!   [`ProductCatalog::usage_stats`]
//!
//! ## Security
//!
//! - API keys are only sent as request headers and are redacted from
//!   `Debug` output and error messages
//! - Search queries are logged only at trace level

pub mod circuit_breaker;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod providers;
pub mod types;

pub use circuit_breaker::CircuitState;
pub use client::{CatalogClient, ProductCatalog};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use provider::{CatalogProvider, SearchParams};
pub use types::{Product, ProviderKind, ProviderUsage};
