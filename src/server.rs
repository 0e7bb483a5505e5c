//! JSON HTTP API and affiliate redirect.
//!
//! ## Endpoints
//!
//! - `GET /health` - liveness
//! - `GET /api/products?q=&category=&marketplace=` - run a search
//! - `GET /api/categories` - category taxonomy
//! - `GET /api/marketplaces` - supported marketplaces
//! - `GET /api/marketplace` - current marketplace
//! - `PUT /api/marketplace/{id}` - select the current marketplace
//! - `GET /go/{asin}?marketplace=` - redirect to the tagged product page

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::routing::{get, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use storefront_catalog::{Product, ProductCatalog, ProviderUsage};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::affiliate::{product_page_link, tag_product};
use crate::config::ServerConfig;
use crate::error::{Result, StorefrontError};
use crate::marketplace::{Marketplace, MarketplaceContext};
use crate::search::{ResultSource, SearchOrchestrator, SearchRequest};

/// Shared handler state.
pub struct AppState<C> {
    pub orchestrator: Arc<SearchOrchestrator<C>>,
    pub marketplaces: Arc<MarketplaceContext>,
    /// Category used when a request names none.
    pub default_category: String,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            marketplaces: Arc::clone(&self.marketplaces),
            default_category: self.default_category.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProductsQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    marketplace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketplaceQuery {
    #[serde(default)]
    marketplace: Option<String>,
}

/// Body of `GET /api/products`.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub query: String,
    pub source: ResultSource,
    pub marketplace: String,
    pub products: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Vec<ProviderUsage>>,
}

/// Error rendered as `{"error": "..."}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<StorefrontError> for ApiError {
    fn from(err: StorefrontError) -> Self {
        let status = match err {
            StorefrontError::Marketplace(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({"error": self.message})),
        )
            .into_response()
    }
}

/// Build the API router over `state`.
pub fn router<C>(state: AppState<C>) -> Router
where
    C: ProductCatalog + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/products", get(products::<C>))
        .route("/api/categories", get(categories::<C>))
        .route("/api/marketplaces", get(marketplaces::<C>))
        .route("/api/marketplace", get(current_marketplace::<C>))
        .route("/api/marketplace/{id}", put(select_marketplace::<C>))
        .route("/go/{asin}", get(go::<C>))
        .with_state(state)
}

/// Running storefront HTTP server.
pub struct StorefrontServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl StorefrontServer {
    /// Bind `{host}:{port}` (port `0` auto-assigns) and serve in a
    /// background task.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Server`] if the listener cannot bind.
    pub async fn start<C>(state: AppState<C>, config: &ServerConfig) -> Result<Self>
    where
        C: ProductCatalog + 'static,
    {
        let app = router(state);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| StorefrontError::Server(format!("bind {bind_addr} failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| StorefrontError::Server(format!("failed to get local addr: {e}")))?;

        tracing::info!("storefront listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("storefront server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for StorefrontServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn marketplace_or_current(
    context: &MarketplaceContext,
    id: Option<&str>,
) -> std::result::Result<Marketplace, ApiError> {
    match id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => context.registry().get(id).cloned().ok_or_else(|| {
            StorefrontError::Marketplace(format!("unknown marketplace id: {id}")).into()
        }),
        None => Ok(context.current()),
    }
}

fn valid_asin(asin: &str) -> bool {
    (1..=16).contains(&asin.len()) && asin.chars().all(|c| c.is_ascii_alphanumeric())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn products<C: ProductCatalog>(
    State(state): State<AppState<C>>,
    Query(params): Query<ProductsQuery>,
) -> std::result::Result<Json<ProductsResponse>, ApiError> {
    let marketplace = marketplace_or_current(&state.marketplaces, params.marketplace.as_deref())?;
    let category = params
        .category
        .as_deref()
        .unwrap_or(&state.default_category);
    let request = SearchRequest {
        search_text: params.q.as_deref().unwrap_or_default(),
        category,
        marketplace: &marketplace,
    };

    let outcome = state.orchestrator.search(&request).await;
    let products = outcome
        .products
        .iter()
        .map(|p| tag_product(p, &marketplace))
        .collect();

    Ok(Json(ProductsResponse {
        query: outcome.resolved.query,
        source: outcome.source,
        marketplace: marketplace.id,
        products,
        usage: outcome.usage,
    }))
}

async fn categories<C: ProductCatalog>(State(state): State<AppState<C>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "categories": state.orchestrator.taxonomy().categories()
    }))
}

async fn marketplaces<C: ProductCatalog>(State(state): State<AppState<C>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "current": state.marketplaces.current().id,
        "marketplaces": state.marketplaces.registry().all()
    }))
}

async fn current_marketplace<C: ProductCatalog>(
    State(state): State<AppState<C>>,
) -> Json<Marketplace> {
    Json(state.marketplaces.current())
}

async fn select_marketplace<C: ProductCatalog>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> std::result::Result<Json<Marketplace>, ApiError> {
    let marketplace = state.marketplaces.set_by_id(&id)?;
    Ok(Json(marketplace))
}

async fn go<C: ProductCatalog>(
    State(state): State<AppState<C>>,
    Path(asin): Path<String>,
    Query(params): Query<MarketplaceQuery>,
) -> std::result::Result<Redirect, ApiError> {
    if !valid_asin(&asin) {
        return Err(ApiError::bad_request(format!("invalid ASIN: {asin}")));
    }
    let marketplace = marketplace_or_current(&state.marketplaces, params.marketplace.as_deref())?;
    let target = product_page_link(&asin, &marketplace);
    tracing::debug!(%asin, marketplace = %marketplace.id, "affiliate redirect");
    Ok(Redirect::temporary(&target))
}
