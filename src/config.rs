//! Configuration types for the storefront service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use storefront_catalog::CatalogConfig;

use crate::error::{Result, StorefrontError};

/// Environment variable overriding `catalog.api_key`.
pub const ENV_RAPIDAPI_KEY: &str = "STOREFRONT_RAPIDAPI_KEY";
/// Environment variable overriding `catalog.canopy_api_key`.
pub const ENV_CANOPY_KEY: &str = "STOREFRONT_CANOPY_KEY";

/// Top-level storefront configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Search pipeline settings.
    pub search: SearchSettings,
    /// Marketplace defaults and affiliate tags.
    pub marketplace: MarketplaceConfig,
    /// Visitor geolocation settings.
    pub geolocation: GeolocationConfig,
    /// Catalog provider settings.
    pub catalog: CatalogConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Port to bind. `0` picks a free port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Search pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum products per result page, also the catalog result ceiling.
    pub page_size: usize,
    /// Freshness window of cached catalog results, in seconds.
    pub cache_ttl_secs: u64,
    /// Upper bound on cached `(marketplace, query)` entries.
    pub cache_max_entries: u64,
    /// Placeholder search text that means "no search text".
    pub default_term: String,
    /// Category selected when a session starts.
    pub default_category: String,
    /// Replacement taxonomy file. `None` uses the built-in tables.
    pub taxonomy_path: Option<PathBuf>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: 40,
            cache_ttl_secs: 300,
            cache_max_entries: 256,
            default_term: "supplements".to_owned(),
            default_category: "beauty".to_owned(),
            taxonomy_path: None,
        }
    }
}

impl SearchSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Marketplace configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Marketplace used when geolocation is disabled or fails.
    pub default_id: String,
    /// Affiliate tag applied to every marketplace without an override.
    pub default_affiliate_tag: String,
    /// Per-marketplace affiliate tag overrides, keyed by marketplace id.
    pub affiliate_tags: BTreeMap<String, String>,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            default_id: "US".to_owned(),
            default_affiliate_tag: "globalsupleme-20".to_owned(),
            affiliate_tags: BTreeMap::new(),
        }
    }
}

/// Visitor geolocation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub enabled: bool,
    /// JSON endpoint answering with a `country_code` field.
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://ipapi.co/json/".to_owned(),
            timeout_secs: 5,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| StorefrontError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| StorefrontError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/storefront/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("storefront")
            .join("config.toml")
    }

    /// Apply credential overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply credential overrides using `lookup` to read variables.
    /// Empty values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = read(ENV_RAPIDAPI_KEY) {
            self.catalog.api_key = Some(key);
        }
        if let Some(key) = read(ENV_CANOPY_KEY) {
            self.catalog.canopy_api_key = Some(key);
        }
    }

    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.search.page_size == 0 {
            return Err(StorefrontError::Config(
                "search.page_size must be greater than 0".into(),
            ));
        }
        if self.search.cache_ttl_secs == 0 {
            return Err(StorefrontError::Config(
                "search.cache_ttl_secs must be greater than 0".into(),
            ));
        }
        if self.search.cache_max_entries == 0 {
            return Err(StorefrontError::Config(
                "search.cache_max_entries must be greater than 0".into(),
            ));
        }
        if self.search.default_term.trim().is_empty() {
            return Err(StorefrontError::Config(
                "search.default_term must not be empty".into(),
            ));
        }
        if self.marketplace.default_affiliate_tag.trim().is_empty() {
            return Err(StorefrontError::Config(
                "marketplace.default_affiliate_tag must not be empty".into(),
            ));
        }
        if self.geolocation.enabled && self.geolocation.timeout_secs == 0 {
            return Err(StorefrontError::Config(
                "geolocation.timeout_secs must be greater than 0".into(),
            ));
        }
        self.catalog.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = StorefrontConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.page_size, 40);
        assert_eq!(config.search.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.search.default_term, "supplements");
        assert_eq!(config.search.default_category, "beauty");
        assert_eq!(config.marketplace.default_id, "US");
        assert_eq!(config.marketplace.default_affiliate_tag, "globalsupleme-20");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = StorefrontConfig::default();
        config.server.port = 9191;
        config.search.default_category = "sports".into();
        config
            .marketplace
            .affiliate_tags
            .insert("DE".into(), "storefront-de-21".into());
        config.save_to_file(&path).unwrap();

        let loaded = StorefrontConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 9191);
        assert_eq!(loaded.search.default_category, "sports");
        assert_eq!(
            loaded.marketplace.affiliate_tags.get("DE").map(String::as_str),
            Some("storefront-de-21")
        );
        assert_eq!(loaded.catalog.max_results, 40);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = StorefrontConfig::from_file(std::path::Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(StorefrontError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        let result = StorefrontConfig::from_file(&path);
        assert!(matches!(result, Err(StorefrontError::Config(_))));
    }

    #[test]
    fn partial_file_uses_defaults() {
        let config: StorefrontConfig = toml::from_str(
            r#"
            [search]
            cache_ttl_secs = 60

            [catalog]
            providers = ["Canopy"]
            "#,
        )
        .unwrap();
        assert_eq!(config.search.cache_ttl_secs, 60);
        assert_eq!(config.search.page_size, 40);
        assert_eq!(config.catalog.providers.len(), 1);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = StorefrontConfig::default_config_path();
        assert!(path.ends_with("storefront/config.toml"));
    }

    #[test]
    fn overrides_set_catalog_keys() {
        let mut config = StorefrontConfig::default();
        config.apply_overrides_from(|name| match name {
            ENV_RAPIDAPI_KEY => Some("rapid".into()),
            ENV_CANOPY_KEY => Some("   ".into()),
            _ => None,
        });
        assert_eq!(config.catalog.api_key.as_deref(), Some("rapid"));
        assert!(config.catalog.canopy_api_key.is_none());
    }

    #[test]
    fn zero_page_size_rejected() {
        let mut config = StorefrontConfig::default();
        config.search.page_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn zero_ttl_rejected() {
        let mut config = StorefrontConfig::default();
        config.search.cache_ttl_secs = 0;
        assert!(config.validate().unwrap_err().to_string().contains("cache_ttl_secs"));
    }

    #[test]
    fn invalid_catalog_config_rejected() {
        let mut config = StorefrontConfig::default();
        config.catalog.providers.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, StorefrontError::Catalog(_)));
    }
}
