use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Circuit breaker policy attached to a resilience configuration.
///
/// Unlike the circuit state, which lives in a
/// [`CircuitBreakerRegistry`](crate::CircuitBreakerRegistry) keyed by
/// operation name, this is a plain value: every call carries the policy it
/// was merged with.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CircuitBreakerConfig {
    /// Whether breaker tracking applies to calls made with this policy.
    pub enabled: bool,
    /// Failures (since the last reset, or within `monitoring_period`) that
    /// open the circuit. Zero is treated as one.
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a probe.
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms"))]
    pub reset_timeout: Duration,
    /// Rolling window for failure accounting. `None` counts every failure
    /// since the circuit last closed.
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms::option"))]
    pub monitoring_period: Option<Duration>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
            monitoring_period: None,
        }
    }
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// A policy with breaker tracking turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Returns a copy with every field present in `overrides` replaced.
    pub fn merge(&self, overrides: &CircuitBreakerOverrides) -> Self {
        Self {
            enabled: overrides.enabled.unwrap_or(self.enabled),
            failure_threshold: overrides.failure_threshold.unwrap_or(self.failure_threshold),
            reset_timeout: overrides.reset_timeout.unwrap_or(self.reset_timeout),
            monitoring_period: overrides.monitoring_period.or(self.monitoring_period),
        }
    }

    pub(crate) fn effective_threshold(&self) -> u32 {
        self.failure_threshold.max(1)
    }
}

/// Partial circuit breaker policy; `None` fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CircuitBreakerOverrides {
    pub enabled: Option<bool>,
    pub failure_threshold: Option<u32>,
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms::option"))]
    pub reset_timeout: Option<Duration>,
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms::option"))]
    pub monitoring_period: Option<Duration>,
}

impl CircuitBreakerOverrides {
    /// Layers `self` over `fallback`: fields set here win.
    pub fn or(self, fallback: CircuitBreakerOverrides) -> Self {
        Self {
            enabled: self.enabled.or(fallback.enabled),
            failure_threshold: self.failure_threshold.or(fallback.failure_threshold),
            reset_timeout: self.reset_timeout.or(fallback.reset_timeout),
            monitoring_period: self.monitoring_period.or(fallback.monitoring_period),
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Builder for [`CircuitBreakerConfig`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self {
            config: CircuitBreakerConfig::default(),
        }
    }

    /// Turns breaker tracking on or off.
    ///
    /// Default: enabled
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Sets the number of failures that opens the circuit.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Sets how long the circuit stays open before a probe is admitted.
    ///
    /// Default: 60 seconds
    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.config.reset_timeout = timeout;
        self
    }

    /// Counts failures only within a rolling window of this length.
    ///
    /// Default: None (failures accumulate until the circuit closes)
    pub fn monitoring_period(mut self, period: Duration) -> Self {
        self.config.monitoring_period = Some(period);
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> CircuitBreakerConfig {
        self.config
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
