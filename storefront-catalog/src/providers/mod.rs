//! Catalog provider implementations.
//!
//! Each module provides a struct implementing
//! [`crate::provider::CatalogProvider`] for one product search API.

pub mod canopy;
pub mod real_time;

pub use canopy::CanopyProvider;
pub use real_time::RealTimeAmazonProvider;

use serde::Deserialize;

/// Ratings arrive as JSON numbers from some providers and as strings
/// (`"4.5"`) from others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(f64),
    Text(String),
}

/// Normalise a provider rating into `0.0..=5.0`; unparseable values are 0.
pub(crate) fn parse_rating(raw: Option<Numeric>) -> f32 {
    let value = match raw {
        Some(Numeric::Number(n)) => n,
        Some(Numeric::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        None => 0.0,
    };
    if value.is_finite() {
        value.clamp(0.0, 5.0) as f32
    } else {
        0.0
    }
}

/// Canonical product page on a marketplace, used when a provider omits it.
pub(crate) fn product_page(domain: &str, asin: &str) -> String {
    format!("https://www.{domain}/dp/{asin}")
}

/// Join an API base URL and a path without doubling slashes.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
