//! Catalog client configuration with sensible defaults.
//!
//! [`CatalogConfig`] controls which providers are queried and in which order,
//! request timeouts, credentials, and circuit breaker thresholds. It is
//! embedded as the `[catalog]` table of the storefront's TOML config.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::error::CatalogError;
use crate::types::ProviderKind;

/// Default base URL of the Real-Time Amazon Data API.
pub const DEFAULT_REAL_TIME_BASE_URL: &str = "https://real-time-amazon-data.p.rapidapi.com";

/// Default base URL of the Canopy REST API.
pub const DEFAULT_CANOPY_BASE_URL: &str = "https://rest.canopyapi.co";

/// Configuration for the multi-provider catalog client.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Providers in priority order. The first provider returning a
    /// non-empty page wins.
    pub providers: Vec<ProviderKind>,
    /// Upper bound on products returned per search, regardless of the
    /// caller's limit.
    pub max_results: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent. If `None`, rotates through a built-in list.
    pub user_agent: Option<String>,
    /// RapidAPI key used by the Real-Time Amazon Data provider.
    pub api_key: Option<String>,
    pub real_time_base_url: String,
    /// Canopy API key.
    pub canopy_api_key: Option<String>,
    pub canopy_base_url: String,
    /// Consecutive failures before a provider's circuit opens.
    pub failure_threshold: u32,
    /// Seconds a tripped provider is skipped before a probe is allowed.
    pub cooldown_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            providers: ProviderKind::all().to_vec(),
            max_results: 40,
            timeout_seconds: 10,
            user_agent: None,
            api_key: None,
            real_time_base_url: DEFAULT_REAL_TIME_BASE_URL.to_owned(),
            canopy_api_key: None,
            canopy_base_url: DEFAULT_CANOPY_BASE_URL.to_owned(),
            failure_threshold: 3,
            cooldown_secs: 60,
        }
    }
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(key: &Option<String>) -> &'static str {
            if key.is_some() { "<set>" } else { "<unset>" }
        }
        f.debug_struct("CatalogConfig")
            .field("providers", &self.providers)
            .field("max_results", &self.max_results)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .field("api_key", &redact(&self.api_key))
            .field("real_time_base_url", &self.real_time_base_url)
            .field("canopy_api_key", &redact(&self.canopy_api_key))
            .field("canopy_base_url", &self.canopy_base_url)
            .field("failure_threshold", &self.failure_threshold)
            .field("cooldown_secs", &self.cooldown_secs)
            .finish()
    }
}

impl CatalogConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `providers` must not be empty
    /// - `failure_threshold` must be greater than 0
    /// - base URLs must parse as absolute URLs
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.max_results == 0 {
            return Err(CatalogError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(CatalogError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.providers.is_empty() {
            return Err(CatalogError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        if self.failure_threshold == 0 {
            return Err(CatalogError::Config(
                "failure_threshold must be greater than 0".into(),
            ));
        }
        for (name, base) in [
            ("real_time_base_url", &self.real_time_base_url),
            ("canopy_base_url", &self.canopy_base_url),
        ] {
            url::Url::parse(base)
                .map_err(|e| CatalogError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        Ok(())
    }

    /// Circuit breaker thresholds derived from this config.
    pub fn circuit_breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            cooldown_secs: self.cooldown_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = CatalogConfig::default();
        assert_eq!(config.max_results, 40);
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.cooldown_secs, 60);
        assert!(config.api_key.is_none());
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn default_providers_in_priority_order() {
        let config = CatalogConfig::default();
        assert_eq!(
            config.providers,
            vec![ProviderKind::RealTimeAmazon, ProviderKind::Canopy]
        );
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(CatalogConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_results_rejected() {
        let config = CatalogConfig {
            max_results: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = CatalogConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn empty_providers_rejected() {
        let config = CatalogConfig {
            providers: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider"));
    }

    #[test]
    fn zero_failure_threshold_rejected() {
        let config = CatalogConfig {
            failure_threshold: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("failure_threshold"));
    }

    #[test]
    fn relative_base_url_rejected() {
        let config = CatalogConfig {
            canopy_base_url: "/api".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("canopy_base_url"));
    }

    #[test]
    fn debug_redacts_keys() {
        let config = CatalogConfig {
            api_key: Some("super-secret-key".into()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("<set>"));
    }

    #[test]
    fn partial_table_uses_defaults() {
        let config: CatalogConfig = serde_json::from_str(r#"{"max_results": 20}"#).unwrap();
        assert_eq!(config.max_results, 20);
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.providers.len(), 2);
    }

    #[test]
    fn circuit_breaker_config_follows_thresholds() {
        let config = CatalogConfig {
            failure_threshold: 5,
            cooldown_secs: 120,
            ..Default::default()
        };
        let breaker = config.circuit_breaker();
        assert_eq!(breaker.failure_threshold, 5);
        assert_eq!(breaker.cooldown_secs, 120);
    }
}
