//! Aggregated throttle and circuit breaker over several dependencies.
//!
//! # States
//! - Closed: admit normally
//! - Open: at least one dependency is fully throttled; admit nothing
//! - HalfOpen: reserved for probing recovery, never produced today

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::statistics::ResourceStatistics;

/// Circuit breaker state derived from dependency health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitBreakerState {
    /// Admit normally.
    Closed,
    /// Stop admitting.
    Open,
    /// Probing recovery. Not currently produced.
    HalfOpen,
}

/// Point-in-time view of a [`ResourceRateLimiter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimiterStatus {
    /// Limiter name.
    pub name: String,
    /// Combined throttle percentage.
    pub rate_limit_adjustment_percentage: f64,
    /// Combined circuit breaker state.
    pub circuit_breaker_state: CircuitBreakerState,
    /// Names of the tracked dependencies.
    pub profiles: Vec<String>,
}

/// Combines several [`ResourceStatistics`] into one throttle signal.
#[derive(Debug, Clone)]
pub struct ResourceRateLimiter {
    name: String,
    profiles: Vec<Arc<ResourceStatistics>>,
}

impl ResourceRateLimiter {
    /// Create a limiter over shared statistics.
    pub fn new(name: impl Into<String>, profiles: Vec<Arc<ResourceStatistics>>) -> Self {
        Self {
            name: name.into(),
            profiles,
        }
    }

    /// Limiter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tracked statistics.
    #[must_use]
    pub fn profiles(&self) -> &[Arc<ResourceStatistics>] {
        &self.profiles
    }

    /// Lowest throttle across all profiles; 1.0 with no profiles.
    #[must_use]
    pub fn rate_limit_adjustment_percentage(&self) -> f64 {
        self.profiles
            .iter()
            .map(|p| p.rate_limit_adjustment_percentage())
            .fold(1.0, f64::min)
    }

    /// Open when any profile is fully throttled, otherwise Closed.
    #[must_use]
    pub fn circuit_breaker_state(&self) -> CircuitBreakerState {
        if self
            .profiles
            .iter()
            .any(|p| p.rate_limit_adjustment_percentage() <= 0.0)
        {
            CircuitBreakerState::Open
        } else {
            CircuitBreakerState::Closed
        }
    }

    /// Snapshot the combined state.
    #[must_use]
    pub fn snapshot(&self) -> RateLimiterStatus {
        RateLimiterStatus {
            name: self.name.clone(),
            rate_limit_adjustment_percentage: self.rate_limit_adjustment_percentage(),
            circuit_breaker_state: self.circuit_breaker_state(),
            profiles: self.profiles.iter().map(|p| p.name().to_string()).collect(),
        }
    }
}
