//! Core types for catalog products, provider identification and usage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::circuit_breaker::CircuitState;

/// A single product returned by a catalog provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Marketplace-wide product identifier (ASIN).
    pub asin: String,
    /// Display title.
    pub title: String,
    /// Price already formatted for display in the marketplace currency.
    /// Empty when the provider did not quote a price.
    pub price: String,
    /// Average star rating, `0.0..=5.0`.
    pub rating: f32,
    /// Number of customer reviews.
    pub reviews: u64,
    /// Product image URL.
    pub image: String,
    /// Outbound product link as returned by the provider.
    pub affiliate_link: String,
    /// Category label, empty when unknown.
    pub category: String,
    /// Eligible for expedited (Prime) shipping.
    pub prime: bool,
    /// Which provider returned this product.
    pub provider: ProviderKind,
}

/// Catalog providers that the client can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Real-Time Amazon Data API on RapidAPI.
    RealTimeAmazon,
    /// Canopy Amazon product API.
    Canopy,
}

impl ProviderKind {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RealTimeAmazon => "RealTimeAmazon",
            Self::Canopy => "Canopy",
        }
    }

    /// Returns all available provider variants in default priority order.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::RealTimeAmazon, Self::Canopy]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-provider usage counters, as reported by
/// [`ProductCatalog::usage_stats`](crate::ProductCatalog::usage_stats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUsage {
    pub provider: ProviderKind,
    /// Requests actually sent (skipped providers are not counted).
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    /// Total products returned across all successful requests.
    pub products_returned: u64,
    /// Circuit breaker state at snapshot time.
    pub circuit: CircuitState,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl ProviderUsage {
    /// Zeroed counters with a closed circuit.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            requests: 0,
            successes: 0,
            failures: 0,
            products_returned: 0,
            circuit: CircuitState::Closed,
            last_success_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            asin: "B000QSNYGI".into(),
            title: "Creatine Monohydrate Powder".into(),
            price: "$27.99".into(),
            rating: 4.7,
            reviews: 91_204,
            image: "https://m.media-amazon.com/images/I/creatine.jpg".into(),
            affiliate_link: "https://www.amazon.com/dp/B000QSNYGI".into(),
            category: "Sports Nutrition".into(),
            prime: true,
            provider: ProviderKind::RealTimeAmazon,
        }
    }

    #[test]
    fn product_serializes_camel_case() {
        let json = serde_json::to_value(sample_product()).expect("serialize");
        assert_eq!(json["affiliateLink"], "https://www.amazon.com/dp/B000QSNYGI");
        assert_eq!(json["reviews"], 91_204);
        assert_eq!(json["provider"], "RealTimeAmazon");
        assert!(json.get("affiliate_link").is_none());
    }

    #[test]
    fn provider_display() {
        assert_eq!(ProviderKind::RealTimeAmazon.to_string(), "RealTimeAmazon");
        assert_eq!(ProviderKind::Canopy.to_string(), "Canopy");
    }

    #[test]
    fn provider_all_in_priority_order() {
        let all = ProviderKind::all();
        assert_eq!(all, &[ProviderKind::RealTimeAmazon, ProviderKind::Canopy]);
    }

    #[test]
    fn new_usage_is_zeroed_and_closed() {
        let usage = ProviderUsage::new(ProviderKind::Canopy);
        assert_eq!(usage.requests, 0);
        assert_eq!(usage.failures, 0);
        assert_eq!(usage.circuit, CircuitState::Closed);
        assert!(usage.last_success_at.is_none());
    }
}
