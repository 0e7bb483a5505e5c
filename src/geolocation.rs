//! Best-effort visitor geolocation.
//!
//! Asks an IP geolocation endpoint for the caller's country and maps it to a
//! marketplace id. [`GeolocationService::detect_or_default`] degrades any
//! failure to [`FALLBACK_MARKETPLACE`]; startup instead keeps the configured
//! marketplace.

use std::time::Duration;

use serde::Deserialize;

use crate::config::GeolocationConfig;
use crate::error::{Result, StorefrontError};
use crate::marketplace::{FALLBACK_MARKETPLACE, marketplace_for_country};

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    country_code: Option<String>,
    /// Set by ipapi.co on rate limiting and reserved ranges.
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Client for the geolocation endpoint.
#[derive(Debug, Clone)]
pub struct GeolocationService {
    client: reqwest::Client,
    endpoint: String,
    enabled: bool,
}

impl GeolocationService {
    /// # Errors
    ///
    /// Returns [`StorefrontError::Geolocation`] if the HTTP client cannot be built.
    pub fn new(config: &GeolocationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| StorefrontError::Geolocation(format!("failed to build client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            enabled: config.enabled,
        })
    }

    /// Look up the caller's country and map it to a marketplace id.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Geolocation`] when detection is disabled,
    /// the request fails, or the response carries no country.
    pub async fn detect_marketplace(&self) -> Result<&'static str> {
        if !self.enabled {
            return Err(StorefrontError::Geolocation("detection disabled".into()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| StorefrontError::Geolocation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorefrontError::Geolocation(format!(
                "endpoint returned HTTP {status}"
            )));
        }

        let body: GeoResponse = response
            .json()
            .await
            .map_err(|e| StorefrontError::Geolocation(format!("invalid response: {e}")))?;

        if body.error {
            return Err(StorefrontError::Geolocation(format!(
                "endpoint reported an error: {}",
                body.reason.as_deref().unwrap_or("unknown")
            )));
        }

        let country = body
            .country_code
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| StorefrontError::Geolocation("response has no country_code".into()))?;

        let marketplace = marketplace_for_country(&country);
        tracing::debug!(%country, marketplace, "geolocation resolved");
        Ok(marketplace)
    }

    /// Like [`detect_marketplace`](Self::detect_marketplace), falling back to
    /// [`FALLBACK_MARKETPLACE`] on any failure.
    pub async fn detect_or_default(&self) -> &'static str {
        match self.detect_marketplace().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, fallback = FALLBACK_MARKETPLACE, "geolocation failed");
                FALLBACK_MARKETPLACE
            }
        }
    }
}
