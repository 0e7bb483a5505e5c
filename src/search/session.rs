//! Observable search session with generation-tagged requests.
//!
//! Every trigger (search text, category, subcategory, marketplace) starts a
//! new generation and moves the state to [`SessionPhase::Fetching`]. A
//! completion is committed only while its generation is still the latest, so
//! a slow response can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use storefront_catalog::{Product, ProductCatalog, ProviderUsage};
use tokio::sync::watch;

use crate::error::Result;
use crate::marketplace::{Marketplace, MarketplaceContext};
use crate::taxonomy::subcategory_key;

use super::orchestrator::{ResultSource, SearchOrchestrator, SearchRequest};

/// Lifecycle of the latest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing requested yet.
    Idle,
    Fetching,
    Settled,
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub loading: bool,
    pub products: Vec<Product>,
    /// Usage from the last catalog fetch; kept across cache hits.
    pub usage: Option<Vec<ProviderUsage>>,
    pub generation: u64,
    pub resolved_query: Option<String>,
    pub source: Option<ResultSource>,
    /// Marketplace the products were searched in.
    pub marketplace_id: String,
}

/// What the visitor currently asked for.
#[derive(Debug, Clone)]
struct Intent {
    search_text: String,
    category: String,
}

/// A single visitor's search session.
pub struct SearchSession<C> {
    orchestrator: Arc<SearchOrchestrator<C>>,
    marketplaces: Arc<MarketplaceContext>,
    intent: Mutex<Intent>,
    latest: AtomicU64,
    state: watch::Sender<SessionState>,
}

impl<C: ProductCatalog> SearchSession<C> {
    /// New idle session with the given starting search text and category.
    pub fn new(
        orchestrator: Arc<SearchOrchestrator<C>>,
        marketplaces: Arc<MarketplaceContext>,
        search_text: &str,
        category: &str,
    ) -> Self {
        let (state, _) = watch::channel(SessionState {
            phase: SessionPhase::Idle,
            loading: false,
            products: Vec::new(),
            usage: None,
            generation: 0,
            resolved_query: None,
            source: None,
            marketplace_id: marketplaces.current().id,
        });
        Self {
            orchestrator,
            marketplaces,
            intent: Mutex::new(Intent {
                search_text: search_text.to_owned(),
                category: category.to_owned(),
            }),
            latest: AtomicU64::new(0),
            state,
        }
    }

    /// Receiver that observes every published state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn marketplace(&self) -> Marketplace {
        self.marketplaces.current()
    }

    pub fn search_text(&self) -> String {
        self.intent().search_text.clone()
    }

    pub fn category(&self) -> String {
        self.intent().category.clone()
    }

    /// Search for typed text. Returns whether the result was committed.
    pub async fn set_search_text(&self, text: &str) -> bool {
        self.intent().search_text = text.to_owned();
        self.refresh().await
    }

    /// Select a category. Active search text still takes precedence.
    pub async fn set_category(&self, category: &str) -> bool {
        self.intent().category = category.to_owned();
        self.refresh().await
    }

    /// Pick a subcategory by display name; it becomes the search text.
    pub async fn select_subcategory(&self, name: &str) -> bool {
        self.set_search_text(&subcategory_key(name)).await
    }

    /// Switch marketplace and search again.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown marketplace id; no search is started.
    pub async fn set_marketplace(&self, id: &str) -> Result<bool> {
        self.marketplaces.set_by_id(id)?;
        Ok(self.refresh().await)
    }

    /// Re-run the current intent as a new generation.
    pub async fn refresh(&self) -> bool {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let intent = self.intent().clone();
        let marketplace = self.marketplaces.current();

        self.state.send_if_modified(|state| {
            if state.generation > generation {
                return false;
            }
            state.phase = SessionPhase::Fetching;
            state.loading = true;
            state.products.clear();
            state.generation = generation;
            state.marketplace_id = marketplace.id.clone();
            true
        });

        let request = SearchRequest {
            search_text: &intent.search_text,
            category: &intent.category,
            marketplace: &marketplace,
        };
        let outcome = self.orchestrator.search(&request).await;

        let committed = self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            state.phase = SessionPhase::Settled;
            state.loading = false;
            state.products = outcome.products;
            if outcome.usage.is_some() {
                state.usage = outcome.usage;
            }
            state.resolved_query = Some(outcome.resolved.query);
            state.source = Some(outcome.source);
            true
        });

        if !committed {
            tracing::debug!(
                generation,
                latest = self.latest.load(Ordering::SeqCst),
                "discarding superseded search result"
            );
        }
        committed
    }

    fn intent(&self) -> std::sync::MutexGuard<'_, Intent> {
        self.intent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
