//! Startup wiring shared by the binaries.
//!
//! Call [`load_config`] then [`initialize`] to get a [`Storefront`] whose
//! marketplace has already been seeded from geolocation, so the first search
//! runs against the detected marketplace.

use std::path::Path;
use std::sync::Arc;

use storefront_catalog::CatalogClient;
use tracing::{info, warn};

use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::geolocation::GeolocationService;
use crate::marketplace::{MarketplaceContext, MarketplaceRegistry};
use crate::search::{SearchOrchestrator, SearchSession};
use crate::server::AppState;
use crate::taxonomy::Taxonomy;

/// Initialised services ready to serve searches.
pub struct Storefront {
    pub config: StorefrontConfig,
    pub orchestrator: Arc<SearchOrchestrator<CatalogClient>>,
    pub marketplaces: Arc<MarketplaceContext>,
}

/// Load configuration from `path`, or from the default location.
///
/// A missing file at the default location yields defaults; an explicit path
/// must exist. Environment overrides are applied and the result validated.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or validation fails.
pub fn load_config(path: Option<&Path>) -> Result<StorefrontConfig> {
    let mut config = match path {
        Some(path) => StorefrontConfig::from_file(path)?,
        None => {
            let default_path = StorefrontConfig::default_config_path();
            if default_path.exists() {
                StorefrontConfig::from_file(&default_path)?
            } else {
                info!(path = %default_path.display(), "no config file, using defaults");
                StorefrontConfig::default()
            }
        }
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Build every service from `config` and run geolocation once.
///
/// # Errors
///
/// Returns an error if the taxonomy, marketplace registry, catalog client or
/// geolocation client cannot be built. Geolocation lookup failures are not
/// errors; the configured default marketplace stays selected.
pub async fn initialize(config: StorefrontConfig) -> Result<Storefront> {
    let taxonomy = Arc::new(Taxonomy::load(config.search.taxonomy_path.as_deref())?);
    info!(categories = taxonomy.categories().len(), "taxonomy loaded");

    let registry = MarketplaceRegistry::new(&config.marketplace)?;
    let marketplaces = Arc::new(MarketplaceContext::new(registry));

    if config.geolocation.enabled {
        let geolocation = GeolocationService::new(&config.geolocation)?;
        match geolocation.detect_marketplace().await {
            Ok(detected) => {
                marketplaces.initialize_from_geolocation(detected);
            }
            Err(e) => warn!(
                error = %e,
                marketplace = %config.marketplace.default_id,
                "geolocation failed, keeping configured marketplace"
            ),
        }
    }
    info!(marketplace = %marketplaces.current().id, "marketplace initialised");

    let catalog = Arc::new(CatalogClient::new(config.catalog.clone())?);
    let orchestrator = Arc::new(SearchOrchestrator::new(catalog, taxonomy, &config.search));

    Ok(Storefront {
        config,
        orchestrator,
        marketplaces,
    })
}

impl Storefront {
    /// Handler state for the HTTP API.
    pub fn app_state(&self) -> AppState<CatalogClient> {
        AppState {
            orchestrator: Arc::clone(&self.orchestrator),
            marketplaces: Arc::clone(&self.marketplaces),
            default_category: self.config.search.default_category.clone(),
        }
    }

    /// New interactive session starting at the configured defaults.
    pub fn session(&self) -> SearchSession<CatalogClient> {
        SearchSession::new(
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.marketplaces),
            &self.config.search.default_term,
            &self.config.search.default_category,
        )
    }
}
