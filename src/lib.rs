//! Storefront: affiliate product search over third-party catalogs.
//!
//! Visitors search by free text or by category; results come back as
//! product cards whose outbound links carry the marketplace's affiliate tag.
//!
//! # Architecture
//!
//! - **Taxonomy**: static category, subcategory and relevance-keyword tables
//! - **Marketplaces**: regional storefronts and the current selection,
//!   optionally seeded from visitor geolocation
//! - **Search**: query resolution, a short-lived `(marketplace, query)` cache,
//!   catalog fetch via `storefront-catalog`, dedup, relevance filter and
//!   review ranking
//! - **Session**: generation-tagged search state for interactive front ends
//! - **Server**: JSON API plus an affiliate redirect endpoint (`axum`)

pub mod affiliate;
pub mod config;
pub mod error;
pub mod geolocation;
pub mod marketplace;
pub mod search;
pub mod server;
pub mod startup;
pub mod taxonomy;

pub use config::StorefrontConfig;
pub use error::{Result, StorefrontError};
pub use marketplace::{Marketplace, MarketplaceContext, MarketplaceRegistry};
pub use search::{SearchOrchestrator, SearchOutcome, SearchRequest, SearchSession};
pub use server::{AppState, StorefrontServer};
pub use taxonomy::Taxonomy;
