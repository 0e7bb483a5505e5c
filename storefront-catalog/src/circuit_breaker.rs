//! Per-provider circuit breaker.
//!
//! Tracks consecutive failures per catalog provider and temporarily skips
//! providers that fail repeatedly, so a provider that is out of quota does
//! not add its timeout to every search. After a cooldown a tripped provider
//! enters a half-open state where one probe decides whether it is restored.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐  N failures   ┌────────┐  cooldown   ┌──────────┐
//! │ Closed ├──────────────►│  Open  ├────────────►│ HalfOpen │
//! └───▲────┘               └────────┘             └────┬─────┘
//!     │                         ▲                      │
//!     │  success                │  failure              │
//!     └─────────────────────────┴──────────────────────┘
//! ```

use crate::types::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Circuit breaker state for a single provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Provider is healthy and receives requests.
    Closed,
    /// Provider failed too often and is skipped until the cooldown expires.
    Open,
    /// Cooldown elapsed; the next request is a probe.
    HalfOpen,
}

#[derive(Debug, Clone)]
struct ProviderHealth {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
        }
    }
}

/// Thresholds for circuit breaker behaviour.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before tripping the circuit to Open.
    pub failure_threshold: u32,
    /// Seconds to wait in Open state before transitioning to HalfOpen.
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_secs: 60,
        }
    }
}

/// Per-provider circuit breaker. Not synchronised; the owning client wraps
/// it in a mutex.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    providers: HashMap<ProviderKind, ProviderHealth>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            providers: HashMap::new(),
        }
    }

    /// Record a successful request. Resets failures and closes the circuit.
    pub fn record_success(&mut self, provider: ProviderKind) {
        let health = self.providers.entry(provider).or_default();
        health.state = CircuitState::Closed;
        health.consecutive_failures = 0;
    }

    /// Record a failed request, opening the circuit at the threshold.
    pub fn record_failure(&mut self, provider: ProviderKind) {
        let health = self.providers.entry(provider).or_default();
        health.consecutive_failures += 1;
        health.last_failure_at = Some(Instant::now());

        if health.consecutive_failures >= self.config.failure_threshold {
            health.state = CircuitState::Open;
        }
    }

    /// Check whether a request to `provider` should be attempted.
    ///
    /// An open circuit whose cooldown has elapsed moves to
    /// [`CircuitState::HalfOpen`] and allows the request.
    pub fn should_attempt(&mut self, provider: ProviderKind) -> bool {
        let health = self.providers.entry(provider).or_default();

        match health.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooldown_elapsed = health
                    .last_failure_at
                    .is_none_or(|t| t.elapsed().as_secs() >= self.config.cooldown_secs);

                if cooldown_elapsed {
                    health.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Current circuit state for `provider` (Closed if never seen).
    pub fn status(&self, provider: ProviderKind) -> CircuitState {
        self.providers
            .get(&provider)
            .map_or(CircuitState::Closed, |h| h.state)
    }

    /// Consecutive failures recorded for `provider` since its last success.
    pub fn consecutive_failures(&self, provider: ProviderKind) -> u32 {
        self.providers
            .get(&provider)
            .map_or(0, |h| h.consecutive_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_breaker(threshold: u32, cooldown_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            cooldown_secs,
        })
    }

    #[test]
    fn initial_state_is_closed() {
        let breaker = make_breaker(3, 60);
        assert_eq!(breaker.status(ProviderKind::RealTimeAmazon), CircuitState::Closed);
        assert_eq!(breaker.status(ProviderKind::Canopy), CircuitState::Closed);
    }

    #[test]
    fn stays_closed_below_threshold() {
        let mut breaker = make_breaker(3, 60);
        breaker.record_failure(ProviderKind::Canopy);
        breaker.record_failure(ProviderKind::Canopy);
        assert_eq!(breaker.status(ProviderKind::Canopy), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(ProviderKind::Canopy), 2);
    }

    #[test]
    fn open_blocks_attempts_during_cooldown() {
        let mut breaker = make_breaker(2, 600);
        breaker.record_failure(ProviderKind::RealTimeAmazon);
        breaker.record_failure(ProviderKind::RealTimeAmazon);
        assert_eq!(breaker.status(ProviderKind::RealTimeAmazon), CircuitState::Open);
        assert!(!breaker.should_attempt(ProviderKind::RealTimeAmazon));
    }

    #[test]
    fn open_transitions_to_half_open_after_cooldown() {
        let mut breaker = make_breaker(1, 0);
        breaker.record_failure(ProviderKind::Canopy);
        assert!(breaker.should_attempt(ProviderKind::Canopy));
        assert_eq!(breaker.status(ProviderKind::Canopy), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_success_restores_closed() {
        let mut breaker = make_breaker(1, 0);
        breaker.record_failure(ProviderKind::Canopy);
        let _ = breaker.should_attempt(ProviderKind::Canopy);
        breaker.record_success(ProviderKind::Canopy);
        assert_eq!(breaker.status(ProviderKind::Canopy), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(ProviderKind::Canopy), 0);
    }

    #[test]
    fn half_open_failure_retrips() {
        let mut breaker = make_breaker(1, 0);
        breaker.record_failure(ProviderKind::RealTimeAmazon);
        let _ = breaker.should_attempt(ProviderKind::RealTimeAmazon);
        breaker.record_failure(ProviderKind::RealTimeAmazon);
        assert_eq!(breaker.status(ProviderKind::RealTimeAmazon), CircuitState::Open);
    }

    #[test]
    fn providers_are_independent() {
        let mut breaker = make_breaker(1, 600);
        breaker.record_failure(ProviderKind::RealTimeAmazon);
        assert!(!breaker.should_attempt(ProviderKind::RealTimeAmazon));
        assert!(breaker.should_attempt(ProviderKind::Canopy));
    }

    #[test]
    fn alternating_results_never_trip() {
        let mut breaker = make_breaker(2, 60);
        for _ in 0..10 {
            breaker.record_failure(ProviderKind::Canopy);
            breaker.record_success(ProviderKind::Canopy);
        }
        assert_eq!(breaker.status(ProviderKind::Canopy), CircuitState::Closed);
    }

    #[test]
    fn circuit_state_serializes_snake_case() {
        let json = serde_json::to_string(&CircuitState::HalfOpen).unwrap();
        assert_eq!(json, "\"half_open\"");
    }
}
