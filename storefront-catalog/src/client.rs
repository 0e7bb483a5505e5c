//! Multi-provider catalog client: priority failover, circuit breaking, usage.
//!
//! Providers are tried one at a time in configured priority order. A
//! provider whose circuit is open is skipped; an error or an empty page
//! falls through to the next provider; the first non-empty page wins.
//! Every attempt updates the provider's usage counters.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::http;
use crate::provider::{CatalogProvider, SearchParams};
use crate::providers::{CanopyProvider, RealTimeAmazonProvider};
use crate::types::{Product, ProviderKind, ProviderUsage};

/// A product catalog that can be searched per marketplace.
///
/// This is the seam the storefront depends on; [`CatalogClient`] is the
/// production implementation.
pub trait ProductCatalog: Send + Sync {
    /// Search the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when no provider could answer.
    fn search(
        &self,
        query: &str,
        limit: usize,
        marketplace_id: &str,
        marketplace_domain: &str,
    ) -> impl Future<Output = Result<Vec<Product>, CatalogError>> + Send;

    /// Snapshot of per-provider usage counters.
    fn usage_stats(&self) -> Vec<ProviderUsage>;
}

/// Production catalog client backed by the configured providers.
pub struct CatalogClient {
    config: CatalogConfig,
    real_time: RealTimeAmazonProvider,
    canopy: CanopyProvider,
    breaker: Mutex<CircuitBreaker>,
    usage: Mutex<HashMap<ProviderKind, ProviderUsage>>,
}

impl CatalogClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if the config is invalid, or
    /// [`CatalogError::Http`] if the HTTP client cannot be built.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        config.validate()?;
        let http = http::build_client(&config)?;
        Ok(Self {
            real_time: RealTimeAmazonProvider::new(http.clone(), &config),
            canopy: CanopyProvider::new(http, &config),
            breaker: Mutex::new(CircuitBreaker::new(config.circuit_breaker())),
            usage: Mutex::new(HashMap::new()),
            config,
        })
    }

    async fn query_provider(
        &self,
        kind: ProviderKind,
        params: &SearchParams<'_>,
    ) -> Result<Vec<Product>, CatalogError> {
        match kind {
            ProviderKind::RealTimeAmazon => self.real_time.search(params).await,
            ProviderKind::Canopy => self.canopy.search(params).await,
        }
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_usage(&self, kind: ProviderKind, update: impl FnOnce(&mut ProviderUsage)) {
        let mut usage = self.usage.lock().unwrap_or_else(PoisonError::into_inner);
        update(usage.entry(kind).or_insert_with(|| ProviderUsage::new(kind)));
    }

    fn record_success(&self, kind: ProviderKind, count: usize) {
        self.breaker().record_success(kind);
        self.with_usage(kind, |u| {
            u.successes += 1;
            u.products_returned += count as u64;
            u.last_success_at = Some(Utc::now());
        });
    }

    fn record_failure(&self, kind: ProviderKind) {
        self.breaker().record_failure(kind);
        self.with_usage(kind, |u| u.failures += 1);
    }
}

impl ProductCatalog for CatalogClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        marketplace_id: &str,
        marketplace_domain: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        let limit = limit.min(self.config.max_results);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let params = SearchParams {
            query,
            limit,
            marketplace_id,
            marketplace_domain,
        };

        let mut errors: Vec<String> = Vec::new();
        let mut answered = false;

        for &kind in &self.config.providers {
            if !self.breaker().should_attempt(kind) {
                tracing::debug!(provider = %kind, "circuit open, skipping provider");
                errors.push(format!("{kind}: circuit open"));
                continue;
            }

            self.with_usage(kind, |u| u.requests += 1);

            match self.query_provider(kind, &params).await {
                Ok(mut products) => {
                    products.truncate(limit);
                    let count = products.len();
                    self.record_success(kind, count);
                    tracing::debug!(provider = %kind, count, "provider returned products");
                    answered = true;
                    if count > 0 {
                        return Ok(products);
                    }
                }
                Err(err) => {
                    tracing::warn!(provider = %kind, error = %err, "provider query failed");
                    self.record_failure(kind);
                    errors.push(format!("{kind}: {err}"));
                }
            }
        }

        if !answered && !errors.is_empty() {
            return Err(CatalogError::AllProvidersFailed(errors.join("; ")));
        }
        Ok(Vec::new())
    }

    fn usage_stats(&self) -> Vec<ProviderUsage> {
        let usage = self.usage.lock().unwrap_or_else(PoisonError::into_inner);
        let breaker = self.breaker();
        self.config
            .providers
            .iter()
            .map(|&kind| {
                let mut snapshot = usage
                    .get(&kind)
                    .cloned()
                    .unwrap_or_else(|| ProviderUsage::new(kind));
                snapshot.circuit = breaker.status(kind);
                snapshot
            })
            .collect()
    }
}
