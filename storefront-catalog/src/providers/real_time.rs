//! Real-Time Amazon Data provider (RapidAPI).
//!
//! `GET {base}/search?query=..&country=..&page=1` authenticated with the
//! `X-RapidAPI-Key` / `X-RapidAPI-Host` header pair. Products live under
//! `data.products`; ratings are quoted as strings.

use serde::Deserialize;

use super::{endpoint, parse_rating, product_page, Numeric};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::provider::{CatalogProvider, SearchParams};
use crate::types::{Product, ProviderKind};

const NAME: &str = "RealTimeAmazon";

/// Real-Time Amazon Data search client.
pub struct RealTimeAmazonProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RealTimeAmazonProvider {
    pub fn new(client: reqwest::Client, config: &CatalogConfig) -> Self {
        Self {
            client,
            base_url: config.real_time_base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// The API names the United Kingdom `GB`; every other marketplace id
    /// is already an ISO country code.
    fn country_code(marketplace_id: &str) -> &str {
        match marketplace_id {
            "UK" => "GB",
            other => other,
        }
    }

    fn rapidapi_host(&self) -> String {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct RealTimeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: Option<RealTimeData>,
    #[serde(default)]
    error: Option<RealTimeErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RealTimeErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RealTimeData {
    #[serde(default)]
    products: Vec<RealTimeProduct>,
}

#[derive(Debug, Deserialize)]
struct RealTimeProduct {
    #[serde(default)]
    asin: String,
    #[serde(default)]
    product_title: String,
    #[serde(default)]
    product_price: Option<String>,
    #[serde(default)]
    product_star_rating: Option<Numeric>,
    #[serde(default)]
    product_num_ratings: Option<u64>,
    #[serde(default)]
    product_photo: Option<String>,
    #[serde(default)]
    product_url: Option<String>,
    #[serde(default)]
    product_category: Option<String>,
    #[serde(default)]
    is_prime: bool,
}

impl RealTimeProduct {
    fn into_product(self, domain: &str) -> Product {
        let affiliate_link = self
            .product_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| product_page(domain, &self.asin));
        Product {
            title: self.product_title,
            price: self.product_price.unwrap_or_default(),
            rating: parse_rating(self.product_star_rating),
            reviews: self.product_num_ratings.unwrap_or(0),
            image: self.product_photo.unwrap_or_default(),
            affiliate_link,
            category: self.product_category.unwrap_or_default(),
            prime: self.is_prime,
            provider: ProviderKind::RealTimeAmazon,
            asin: self.asin,
        }
    }
}

/// Decode a Real-Time Amazon Data search body.
pub(crate) fn parse_response(
    body: &str,
    domain: &str,
    limit: usize,
) -> Result<Vec<Product>, CatalogError> {
    let response: RealTimeResponse = serde_json::from_str(body)
        .map_err(|e| CatalogError::Parse(format!("{NAME} body: {e}")))?;

    if !response.status.eq_ignore_ascii_case("OK") {
        let message = response
            .error
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("status {}", response.status));
        return Err(CatalogError::Provider(format!("{NAME}: {message}")));
    }

    let data = response
        .data
        .ok_or_else(|| CatalogError::Parse(format!("{NAME}: missing data")))?;

    Ok(data
        .products
        .into_iter()
        .filter(|p| !p.asin.is_empty())
        .take(limit)
        .map(|p| p.into_product(domain))
        .collect())
}

impl CatalogProvider for RealTimeAmazonProvider {
    async fn search(&self, params: &SearchParams<'_>) -> Result<Vec<Product>, CatalogError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CatalogError::Config(format!("{NAME}: api_key is not set")));
        };

        tracing::trace!(query = params.query, marketplace = params.marketplace_id, "{NAME} search");

        let response = self
            .client
            .get(endpoint(&self.base_url, "search"))
            .query(&[
                ("query", params.query),
                ("country", Self::country_code(params.marketplace_id)),
                ("page", "1"),
            ])
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", self.rapidapi_host())
            .send()
            .await
            .map_err(|e| CatalogError::from_request(NAME, e))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::Provider(format!("{NAME}: rate limited")));
        }

        let body = response
            .error_for_status()
            .map_err(|e| CatalogError::Http(format!("{NAME} HTTP error: {e}")))?
            .text()
            .await
            .map_err(|e| CatalogError::from_request(NAME, e))?;

        tracing::trace!(bytes = body.len(), "{NAME} response received");

        parse_response(&body, params.marketplace_domain, params.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": "OK",
        "request_id": "abc",
        "data": {
            "total_products": 3,
            "country": "US",
            "products": [
                {
                    "asin": "B000QSNYGI",
                    "product_title": "Optimum Nutrition Micronized Creatine Monohydrate",
                    "product_price": "$27.99",
                    "product_star_rating": "4.7",
                    "product_num_ratings": 91204,
                    "product_url": "https://www.amazon.com/dp/B000QSNYGI",
                    "product_photo": "https://m.media-amazon.com/images/I/creatine.jpg",
                    "is_prime": true
                },
                {
                    "asin": "B00E9M4XEE",
                    "product_title": "Fish Oil Omega 3",
                    "product_price": null,
                    "product_star_rating": null,
                    "product_num_ratings": null,
                    "product_url": null,
                    "product_photo": null
                },
                {
                    "asin": "",
                    "product_title": "Sponsored placeholder"
                }
            ]
        }
    }"#;

    #[test]
    fn parses_products() {
        let products = parse_response(SAMPLE, "amazon.com", 40).expect("parse");
        assert_eq!(products.len(), 2);

        let first = &products[0];
        assert_eq!(first.asin, "B000QSNYGI");
        assert_eq!(first.price, "$27.99");
        assert!((first.rating - 4.7).abs() < 1e-6);
        assert_eq!(first.reviews, 91_204);
        assert!(first.prime);
        assert_eq!(first.provider, ProviderKind::RealTimeAmazon);
    }

    #[test]
    fn missing_fields_fall_back() {
        let products = parse_response(SAMPLE, "amazon.de", 40).expect("parse");
        let second = &products[1];
        assert_eq!(second.price, "");
        assert_eq!(second.rating, 0.0);
        assert_eq!(second.reviews, 0);
        assert!(!second.prime);
        assert_eq!(second.affiliate_link, "https://www.amazon.de/dp/B00E9M4XEE");
    }

    #[test]
    fn product_without_asin_is_skipped() {
        let body = r#"{"status":"OK","data":{"products":[
            {"product_title":"Bundle without asin"},
            {"asin":"B0CREATINE","product_title":"Creatine"}
        ]}}"#;
        let products = parse_response(body, "amazon.com", 40).expect("parse");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].asin, "B0CREATINE");
    }

    #[test]
    fn limit_truncates() {
        let products = parse_response(SAMPLE, "amazon.com", 1).expect("parse");
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn error_status_is_provider_error() {
        let body = r#"{"status":"ERROR","error":{"message":"You have exceeded the quota"}}"#;
        let err = parse_response(body, "amazon.com", 40).unwrap_err();
        assert!(matches!(err, CatalogError::Provider(_)));
        assert!(err.to_string().contains("exceeded the quota"));
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let err = parse_response("<html>", "amazon.com", 40).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn uk_maps_to_gb() {
        assert_eq!(RealTimeAmazonProvider::country_code("UK"), "GB");
        assert_eq!(RealTimeAmazonProvider::country_code("DE"), "DE");
    }

    #[tokio::test]
    async fn missing_key_is_config_error() {
        let config = CatalogConfig::default();
        let client = crate::http::build_client(&config).expect("client");
        let provider = RealTimeAmazonProvider::new(client, &config);
        let params = SearchParams {
            query: "creatine",
            limit: 10,
            marketplace_id: "US",
            marketplace_domain: "amazon.com",
        };
        let err = provider.search(&params).await.unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }
}
