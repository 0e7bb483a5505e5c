//! Search orchestration: resolve, cache lookup, catalog fetch, shape.
//!
//! # Pipeline
//!
//! 1. Resolve the catalog query from search text or category
//! 2. Serve a fresh `(marketplace, query)` cache entry if there is one
//! 3. Otherwise fetch from the catalog, dedup by ASIN, rank by reviews and
//!    cache the unfiltered superset
//! 4. Apply the subcategory relevance filter and truncate to a page
//!
//! Catalog failures never escape: they are logged and produce an empty page.

use std::sync::Arc;

use serde::Serialize;
use storefront_catalog::{Product, ProductCatalog, ProviderUsage};

use crate::config::SearchSettings;
use crate::marketplace::Marketplace;
use crate::taxonomy::Taxonomy;

use super::cache::{CacheEntry, CacheKey, ProductCache};
use super::pipeline::{dedup_and_rank, present};
use super::query::{ResolvedQuery, resolve_query};

/// One search intent against one marketplace.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Free text typed by the visitor (possibly blank or the placeholder).
    pub search_text: &'a str,
    /// Selected category id.
    pub category: &'a str,
    pub marketplace: &'a Marketplace,
}

/// Where the products of an outcome came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Cache,
    Catalog,
    /// The catalog call failed; products are empty.
    Failed,
}

/// Result of [`SearchOrchestrator::search`].
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub resolved: ResolvedQuery,
    pub products: Vec<Product>,
    pub source: ResultSource,
    /// Provider usage snapshot, present only after a successful fetch.
    pub usage: Option<Vec<ProviderUsage>>,
}

/// Shared search service. Cheap to share behind an `Arc`.
pub struct SearchOrchestrator<C> {
    catalog: Arc<C>,
    taxonomy: Arc<Taxonomy>,
    cache: ProductCache,
    page_size: usize,
    default_term: String,
}

impl<C: ProductCatalog> SearchOrchestrator<C> {
    pub fn new(catalog: Arc<C>, taxonomy: Arc<Taxonomy>, settings: &SearchSettings) -> Self {
        Self {
            catalog,
            taxonomy,
            cache: ProductCache::new(settings.cache_ttl(), settings.cache_max_entries),
            page_size: settings.page_size,
            default_term: settings.default_term.clone(),
        }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Resolve the catalog query for `request` without searching.
    pub fn resolve(&self, request: &SearchRequest<'_>) -> ResolvedQuery {
        resolve_query(
            request.search_text,
            request.category,
            &self.taxonomy,
            &self.default_term,
        )
    }

    /// Run one search. Never fails; see [`ResultSource::Failed`].
    pub async fn search(&self, request: &SearchRequest<'_>) -> SearchOutcome {
        let resolved = self.resolve(request);
        let marketplace = request.marketplace;
        let key = CacheKey::new(&marketplace.id, &resolved.query);
        let keywords = resolved
            .filter_key
            .as_deref()
            .and_then(|k| self.taxonomy.filter_keywords(k));

        if let Some(entry) = self.cache.get(&key).await {
            let products = present(&entry.products, keywords, self.page_size);
            tracing::debug!(
                marketplace = %marketplace.id,
                cached = entry.products.len(),
                shown = products.len(),
                "serving cached products"
            );
            return SearchOutcome {
                resolved,
                products,
                source: ResultSource::Cache,
                usage: None,
            };
        }

        tracing::debug!(marketplace = %marketplace.id, "cache miss, querying catalog");
        let fetched = self
            .catalog
            .search(
                &resolved.query,
                self.page_size,
                &marketplace.id,
                &marketplace.domain,
            )
            .await;

        match fetched {
            Ok(raw) => {
                let fetched_count = raw.len();
                let ranked = dedup_and_rank(raw);
                let products = present(&ranked, keywords, self.page_size);
                tracing::info!(
                    marketplace = %marketplace.id,
                    fetched = fetched_count,
                    unique = ranked.len(),
                    shown = products.len(),
                    "catalog search complete"
                );
                self.cache.put(key, CacheEntry::now(ranked)).await;
                SearchOutcome {
                    resolved,
                    products,
                    source: ResultSource::Catalog,
                    usage: Some(self.catalog.usage_stats()),
                }
            }
            Err(e) => {
                tracing::warn!(marketplace = %marketplace.id, error = %e, "catalog search failed");
                SearchOutcome {
                    resolved,
                    products: Vec::new(),
                    source: ResultSource::Failed,
                    usage: None,
                }
            }
        }
    }
}

impl<C> std::fmt::Debug for SearchOrchestrator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("cache", &self.cache)
            .field("page_size", &self.page_size)
            .field("default_term", &self.default_term)
            .finish_non_exhaustive()
    }
}
