//! Canopy Amazon product API.
//!
//! `GET {base}/api/amazon/search?searchTerm=..&domain=..` with an
//! `API-KEY` header. Results are nested under
//! `data.amazonProductSearchResults.productResults.results`.

use serde::Deserialize;

use super::{endpoint, parse_rating, product_page, Numeric};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::provider::{CatalogProvider, SearchParams};
use crate::types::{Product, ProviderKind};

const NAME: &str = "Canopy";

/// Canopy REST search client.
pub struct CanopyProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CanopyProvider {
    pub fn new(client: reqwest::Client, config: &CatalogConfig) -> Self {
        Self {
            client,
            base_url: config.canopy_base_url.clone(),
            api_key: config.canopy_api_key.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CanopyResponse {
    #[serde(default)]
    data: Option<CanopyData>,
    #[serde(default)]
    errors: Vec<CanopyErrorBody>,
}

#[derive(Debug, Deserialize)]
struct CanopyErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanopyData {
    #[serde(default)]
    amazon_product_search_results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResults {
    product_results: ProductResults,
}

#[derive(Debug, Deserialize)]
struct ProductResults {
    #[serde(default)]
    results: Vec<CanopyProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanopyProduct {
    #[serde(default)]
    asin: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    main_image_url: Option<String>,
    #[serde(default)]
    rating: Option<Numeric>,
    #[serde(default)]
    ratings_total: Option<u64>,
    #[serde(default)]
    price: Option<CanopyPrice>,
    #[serde(default)]
    is_prime: Option<bool>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CanopyPrice {
    #[serde(default)]
    display: Option<String>,
}

impl CanopyProduct {
    fn into_product(self, domain: &str) -> Product {
        let affiliate_link = self
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| product_page(domain, &self.asin));
        Product {
            title: self.title,
            price: self.price.and_then(|p| p.display).unwrap_or_default(),
            rating: parse_rating(self.rating),
            reviews: self.ratings_total.unwrap_or(0),
            image: self.main_image_url.unwrap_or_default(),
            affiliate_link,
            category: self.category.unwrap_or_default(),
            prime: self.is_prime.unwrap_or(false),
            provider: ProviderKind::Canopy,
            asin: self.asin,
        }
    }
}

/// Decode a Canopy search body.
pub(crate) fn parse_response(
    body: &str,
    domain: &str,
    limit: usize,
) -> Result<Vec<Product>, CatalogError> {
    let response: CanopyResponse = serde_json::from_str(body)
        .map_err(|e| CatalogError::Parse(format!("{NAME} body: {e}")))?;

    if let Some(first) = response.errors.first() {
        return Err(CatalogError::Provider(format!("{NAME}: {}", first.message)));
    }

    // A search with zero hits comes back without the results object.
    let Some(results) = response
        .data
        .and_then(|d| d.amazon_product_search_results)
    else {
        return Ok(Vec::new());
    };

    Ok(results
        .product_results
        .results
        .into_iter()
        .filter(|p| !p.asin.is_empty())
        .take(limit)
        .map(|p| p.into_product(domain))
        .collect())
}

impl CatalogProvider for CanopyProvider {
    async fn search(&self, params: &SearchParams<'_>) -> Result<Vec<Product>, CatalogError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CatalogError::Config(format!("{NAME}: canopy_api_key is not set")));
        };

        tracing::trace!(query = params.query, marketplace = params.marketplace_id, "{NAME} search");

        let response = self
            .client
            .get(endpoint(&self.base_url, "api/amazon/search"))
            .query(&[
                ("searchTerm", params.query),
                ("domain", params.marketplace_id),
            ])
            .header("API-KEY", api_key)
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
