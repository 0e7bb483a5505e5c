//! Integration tests for the multi-provider catalog client.
//!
//! Both providers are served by wiremock; no real network calls are made.

use serde_json::json;
use storefront_catalog::{
    CatalogClient, CatalogConfig, CatalogError, CircuitState, ProductCatalog, ProviderKind,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(real_time: &MockServer, canopy: &MockServer) -> CatalogConfig {
    CatalogConfig {
        api_key: Some("rapid-key".into()),
        canopy_api_key: Some("canopy-key".into()),
        real_time_base_url: real_time.uri(),
        canopy_base_url: canopy.uri(),
        user_agent: Some("StorefrontTest/1.0".into()),
        ..Default::default()
    }
}

fn real_time_body(asins: &[&str]) -> serde_json::Value {
    let products: Vec<_> = asins
        .iter()
        .enumerate()
        .map(|(i, asin)| {
            json!({
                "asin": asin,
                "product_title": format!("Creatine Monohydrate {i}"),
                "product_price": "$24.99",
                "product_star_rating": "4.6",
                "product_num_ratings": 1000 - i as u64,
                "product_url": format!("https://www.amazon.com/dp/{asin}"),
                "product_photo": "https://m.media-amazon.com/images/I/x.jpg",
                "is_prime": true
            })
        })
        .collect();
    json!({ "status": "OK", "data": { "products": products } })
}

fn canopy_body(asins: &[&str]) -> serde_json::Value {
    let results: Vec<_> = asins
        .iter()
        .map(|asin| {
            json!({
                "asin": asin,
                "title": "Vitamin C Facial Serum",
                "rating": 4.3,
                "ratingsTotal": 512,
                "price": { "display": "$15.00" },
                "isPrime": false
            })
        })
        .collect();
    json!({
        "data": {
            "amazonProductSearchResults": { "productResults": { "results": results } }
        }
    })
}

#[tokio::test]
async fn primary_provider_answers_and_fallback_is_not_called() {
    let real_time = MockServer::start().await;
    let canopy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "creatine monohydrate"))
        .and(query_param("country", "US"))
        .and(header("X-RapidAPI-Key", "rapid-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(real_time_body(&["A1", "A2"])))
        .expect(1)
        .mount(&real_time)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(canopy_body(&["C1"])))
        .expect(0)
        .mount(&canopy)
        .await;

    let client = CatalogClient::new(config_for(&real_time, &canopy)).expect("client");
    let products = client
        .search("creatine monohydrate", 40, "US", "amazon.com")
        .await
        .expect("search");

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].asin, "A1");
    assert_eq!(products[0].provider, ProviderKind::RealTimeAmazon);

    let stats = client.usage_stats();
    assert_eq!(stats[0].requests, 1);
    assert_eq!(stats[0].successes, 1);
    assert_eq!(stats[0].products_returned, 2);
    assert!(stats[0].last_success_at.is_some());
    assert_eq!(stats[1].requests, 0);
}

#[tokio::test]
async fn server_error_falls_through_to_next_provider() {
    let real_time = MockServer::start().await;
    let canopy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&real_time)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/amazon/search"))
        .and(query_param("searchTerm", "skincare facial serum"))
        .and(query_param("domain", "DE"))
        .and(header("API-KEY", "canopy-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(canopy_body(&["C1", "C2"])))
        .expect(1)
        .mount(&canopy)
        .await;

    let client = CatalogClient::new(config_for(&real_time, &canopy)).expect("client");
    let products = client
        .search("skincare facial serum", 40, "DE", "amazon.de")
        .await
        .expect("search");

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].provider, ProviderKind::Canopy);
    assert_eq!(products[0].affiliate_link, "https://www.amazon.de/dp/C1");

    let stats = client.usage_stats();
    assert_eq!(stats[0].failures, 1);
    assert_eq!(stats[1].successes, 1);
}

#[tokio::test]
async fn empty_page_falls_through_to_next_provider() {
    let real_time = MockServer::start().await;
    let canopy = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(real_time_body(&[])))
        .mount(&real_time)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(canopy_body(&["C9"])))
        .expect(1)
        .mount(&canopy)
        .await;

    let client = CatalogClient::new(config_for(&real_time, &canopy)).expect("client");
    let products = client
        .search("melatonin", 40, "US", "amazon.com")
        .await
        .expect("search");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].asin, "C9");
    // An empty page is an answer, not a failure.
    assert_eq!(client.usage_stats()[0].failures, 0);
}

#[tokio::test]
async fn all_empty_pages_is_ok_and_empty() {
    let real_time = MockServer::start().await;
    let canopy = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(real_time_body(&[])))
        .mount(&real_time)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&canopy)
        .await;

    let client = CatalogClient::new(config_for(&real_time, &canopy)).expect("client");
    let products = client
        .search("zzzz", 40, "US", "amazon.com")
        .await
        .expect("search");
    assert!(products.is_empty());
}

#[tokio::test]
async fn every_provider_failing_is_an_error() {
    let real_time = MockServer::start().await;
    let canopy = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&real_time)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&canopy)
        .await;

    let client = CatalogClient::new(config_for(&real_time, &canopy)).expect("client");
    let err = client
        .search("protein", 40, "US", "amazon.com")
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::AllProvidersFailed(_)));
    let msg = err.to_string();
    assert!(msg.contains("rate limited"));
    assert!(msg.contains("Canopy"));
}

#[tokio::test]
async fn tripped_provider_is_skipped_until_cooldown() {
    let real_time = MockServer::start().await;
    let canopy = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&real_time)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(canopy_body(&["C1"])))
        .expect(2)
        .mount(&canopy)
        .await;

    let config = CatalogConfig {
        failure_threshold: 1,
        cooldown_secs: 600,
        ..config_for(&real_time, &canopy)
    };
    let client = CatalogClient::new(config).expect("client");

    for _ in 0..2 {
        let products = client
            .search("bcaa", 40, "US", "amazon.com")
            .await
            .expect("search");
        assert_eq!(products.len(), 1);
    }

    let stats = client.usage_stats();
    assert_eq!(stats[0].requests, 1);
    assert_eq!(stats[0].circuit, CircuitState::Open);
    assert_eq!(stats[1].requests, 2);
}

#[tokio::test]
async fn uk_marketplace_sends_gb_country() {
    let real_time = MockServer::start().await;
    let canopy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("country", "GB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(real_time_body(&["U1"])))
        .expect(1)
        .mount(&real_time)
        .await;

    let client = CatalogClient::new(config_for(&real_time, &canopy)).expect("client");
    let products = client
        .search("omega 3", 40, "UK", "amazon.co.uk")
        .await
        .expect("search");
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn results_are_capped_by_limit_and_max_results() {
    let real_time = MockServer::start().await;
    let canopy = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(real_time_body(&["A", "B", "C", "D", "E"])),
        )
        .mount(&real_time)
        .await;

    let config = CatalogConfig {
        max_results: 3,
        ..config_for(&real_time, &canopy)
    };
    let client = CatalogClient::new(config).expect("client");

    let capped = client.search("zinc", 40, "US", "amazon.com").await.expect("search");
    assert_eq!(capped.len(), 3);

    let limited = client.search("zinc", 2, "US", "amazon.com").await.expect("search");
    assert_eq!(limited.len(), 2);
}
