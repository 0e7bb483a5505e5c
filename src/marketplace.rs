//! Regional marketplaces and the process-wide "current marketplace".
//!
//! The registry is fixed at startup from [`MarketplaceConfig`]; only the
//! selection held by [`MarketplaceContext`] changes at runtime.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use crate::config::MarketplaceConfig;
use crate::error::{Result, StorefrontError};

/// Marketplace id used when nothing better is known.
pub const FALLBACK_MARKETPLACE: &str = "US";

/// `(id, name, domain, currency)` for every supported marketplace.
const MARKETPLACES: &[(&str, &str, &str, &str)] = &[
    ("US", "United States", "amazon.com", "USD"),
    ("CA", "Canada", "amazon.ca", "CAD"),
    ("UK", "United Kingdom", "amazon.co.uk", "GBP"),
    ("DE", "Germany", "amazon.de", "EUR"),
    ("FR", "France", "amazon.fr", "EUR"),
    ("IT", "Italy", "amazon.it", "EUR"),
    ("ES", "Spain", "amazon.es", "EUR"),
    ("JP", "Japan", "amazon.co.jp", "JPY"),
    ("AU", "Australia", "amazon.com.au", "AUD"),
    ("NL", "Netherlands", "amazon.nl", "EUR"),
    ("SE", "Sweden", "amazon.se", "SEK"),
    ("SG", "Singapore", "amazon.sg", "SGD"),
    ("PL", "Poland", "amazon.pl", "PLN"),
    ("SA", "Saudi Arabia", "amazon.sa", "SAR"),
];

/// A regional storefront with its affiliate tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marketplace {
    pub id: String,
    pub name: String,
    /// Bare host without `www.`, e.g. `amazon.co.uk`.
    pub domain: String,
    pub currency: String,
    pub affiliate_tag: String,
}

/// Map an ISO 3166 country code to the marketplace that serves it.
///
/// Countries without their own marketplace go to the nearest regional one;
/// everything else gets [`FALLBACK_MARKETPLACE`].
pub fn marketplace_for_country(country_code: &str) -> &'static str {
    let code = country_code.trim().to_ascii_uppercase();
    match code.as_str() {
        "GB" | "IE" => "UK",
        "AT" | "CH" | "LI" => "DE",
        "BE" | "LU" | "MC" => "FR",
        "NZ" => "AU",
        "AE" | "KW" | "BH" | "QA" | "OM" => "SA",
        other => MARKETPLACES
            .iter()
            .find(|(id, ..)| *id == other)
            .map_or(FALLBACK_MARKETPLACE, |(id, ..)| *id),
    }
}

/// The set of marketplaces this deployment sells through.
#[derive(Debug, Clone)]
pub struct MarketplaceRegistry {
    marketplaces: Vec<Marketplace>,
    default_index: usize,
}

impl MarketplaceRegistry {
    /// Build the registry, applying per-marketplace tag overrides.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Marketplace`] if `default_id` or an
    /// override key names an unknown marketplace.
    pub fn new(config: &MarketplaceConfig) -> Result<Self> {
        for id in config.affiliate_tags.keys() {
            if !MARKETPLACES.iter().any(|(known, ..)| known.eq_ignore_ascii_case(id)) {
                return Err(StorefrontError::Marketplace(format!(
                    "affiliate tag configured for unknown marketplace id: {id}"
                )));
            }
        }

        let marketplaces = MARKETPLACES
            .iter()
            .map(|&(id, name, domain, currency)| {
                let affiliate_tag = config
                    .affiliate_tags
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(id))
                    .map_or(&config.default_affiliate_tag, |(_, tag)| tag)
                    .clone();
                Marketplace {
                    id: id.to_owned(),
                    name: name.to_owned(),
                    domain: domain.to_owned(),
                    currency: currency.to_owned(),
                    affiliate_tag,
                }
            })
            .collect();

        let default_index = MARKETPLACES
            .iter()
            .position(|(id, ..)| id.eq_ignore_ascii_case(config.default_id.trim()))
            .ok_or_else(|| {
                StorefrontError::Marketplace(format!(
                    "unknown default marketplace id: {}",
                    config.default_id
                ))
            })?;

        Ok(Self {
            marketplaces,
            default_index,
        })
    }

    pub fn all(&self) -> &[Marketplace] {
        &self.marketplaces
    }

    /// Look up a marketplace by id, ignoring ASCII case.
    pub fn get(&self, id: &str) -> Option<&Marketplace> {
        self.marketplaces
            .iter()
            .find(|m| m.id.eq_ignore_ascii_case(id.trim()))
    }

    /// The configured default marketplace.
    pub fn default_marketplace(&self) -> &Marketplace {
        &self.marketplaces[self.default_index]
    }
}

/// The marketplace currently selected for searches and outbound links.
#[derive(Debug)]
pub struct MarketplaceContext {
    registry: MarketplaceRegistry,
    current: RwLock<Marketplace>,
}

impl MarketplaceContext {
    /// Start on the registry's default marketplace.
    pub fn new(registry: MarketplaceRegistry) -> Self {
        let current = registry.default_marketplace().clone();
        Self {
            registry,
            current: RwLock::new(current),
        }
    }

    pub fn registry(&self) -> &MarketplaceRegistry {
        &self.registry
    }

    /// Snapshot of the current marketplace.
    pub fn current(&self) -> Marketplace {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch to the marketplace with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Marketplace`] for an unknown id; the
    /// current selection is left unchanged.
    pub fn set_by_id(&self, id: &str) -> Result<Marketplace> {
        let next = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| StorefrontError::Marketplace(format!("unknown marketplace id: {id}")))?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next.clone();
        tracing::info!(marketplace = %next.id, domain = %next.domain, "marketplace selected");
        Ok(next)
    }

    /// Apply a geolocation result. Unknown ids keep the current selection.
    pub fn initialize_from_geolocation(&self, marketplace_id: &str) -> Marketplace {
        match self.set_by_id(marketplace_id) {
            Ok(marketplace) => marketplace,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring detected marketplace");
                self.current()
            }
        }
    }
}
