use crate::presets::Preset;
use callguard_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerOverrides};
use callguard_retry::{Backoff, BackoffStrategy, RetryPolicy, StatusSet};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a single named call is made resilient.
///
/// A plain value: presets are templates of this type, and every call runs
/// with a copy merged from the executor's base configuration and the caller's
/// [`ResilienceOverrides`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResilienceConfig {
    /// Attempts beyond the first.
    pub max_retries: u32,
    /// Growth of the delay between attempts.
    pub backoff_strategy: BackoffStrategy,
    /// Delay unit the strategy scales.
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms"))]
    pub base_delay: Duration,
    /// Upper clamp for any single delay (applied before jitter).
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms"))]
    pub max_delay: Duration,
    /// Scale each delay by a random factor in `[0.5, 1.0]`.
    pub jitter: bool,
    /// HTTP statuses that trigger a retry.
    pub retry_on: StatusSet,
    /// Bound on a single attempt.
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms"))]
    pub timeout: Duration,
    /// Breaker policy for the operation.
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_strategy: BackoffStrategy::Exponential,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            jitter: true,
            retry_on: StatusSet::transient(),
            timeout: Duration::from_millis(30_000),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl ResilienceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::new()
    }

    /// The template for `preset`.
    pub fn preset(preset: Preset) -> Self {
        preset.config()
    }

    /// Returns a copy with every field present in `overrides` replaced.
    pub fn merge(&self, overrides: &ResilienceOverrides) -> Self {
        Self {
            max_retries: overrides.max_retries.unwrap_or(self.max_retries),
            backoff_strategy: overrides.backoff_strategy.unwrap_or(self.backoff_strategy),
            base_delay: overrides.base_delay.unwrap_or(self.base_delay),
            max_delay: overrides.max_delay.unwrap_or(self.max_delay),
            jitter: overrides.jitter.unwrap_or(self.jitter),
            retry_on: overrides
                .retry_on
                .clone()
                .unwrap_or_else(|| self.retry_on.clone()),
            timeout: overrides.timeout.unwrap_or(self.timeout),
            circuit_breaker: self.circuit_breaker.merge(&overrides.circuit_breaker),
        }
    }

    /// Backoff schedule described by this configuration.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.backoff_strategy, self.base_delay)
            .max_delay(self.max_delay)
            .jitter(self.jitter)
    }

    /// Retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff(), self.retry_on.clone())
    }
}

/// Partial [`ResilienceConfig`]; `None` fields keep the base value.
///
/// ```
/// use callguard_executor::{Preset, ResilienceConfig, ResilienceOverrides};
/// use std::time::Duration;
///
/// let config = ResilienceConfig::preset(Preset::Query).merge(
///     &ResilienceOverrides::new()
///         .max_retries(1)
///         .timeout(Duration::from_secs(2)),
/// );
///
/// assert_eq!(config.max_retries, 1);
/// assert_eq!(config.timeout, Duration::from_secs(2));
/// assert!(!config.jitter);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResilienceOverrides {
    pub max_retries: Option<u32>,
    pub backoff_strategy: Option<BackoffStrategy>,
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms::option"))]
    pub base_delay: Option<Duration>,
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms::option"))]
    pub max_delay: Option<Duration>,
    pub jitter: Option<bool>,
    pub retry_on: Option<StatusSet>,
    #[cfg_attr(feature = "serde", serde(with = "callguard_core::serde_ms::option"))]
    pub timeout: Option<Duration>,
    pub circuit_breaker: CircuitBreakerOverrides,
}

impl ResilienceOverrides {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the number of attempts beyond the first.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Overrides how the delay grows between retries.
    pub fn backoff_strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff_strategy = Some(strategy);
        self
    }

    /// Overrides the delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    /// Overrides the upper clamp on any single delay.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Overrides whether delays are jittered.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Replaces the set of retryable HTTP statuses.
    pub fn retry_on(mut self, statuses: impl Into<StatusSet>) -> Self {
        self.retry_on = Some(statuses.into());
        self
    }

    /// Overrides the per-attempt time bound.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables or disables breaker tracking for the call.
    pub fn circuit_breaker_enabled(mut self, enabled: bool) -> Self {
        self.circuit_breaker.enabled = Some(enabled);
        self
    }

    /// Overrides the failures needed to open the breaker.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.circuit_breaker.failure_threshold = Some(threshold);
        self
    }

    /// Overrides how long the breaker stays open before probing.
    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.circuit_breaker.reset_timeout = Some(timeout);
        self
    }

    /// Counts only failures within `period` toward the threshold.
    pub fn monitoring_period(mut self, period: Duration) -> Self {
        self.circuit_breaker.monitoring_period = Some(period);
        self
    }

    /// Layers `self` over `fallback`: fields set here win.
    pub fn or(self, fallback: ResilienceOverrides) -> Self {
        Self {
            max_retries: self.max_retries.or(fallback.max_retries),
            backoff_strategy: self.backoff_strategy.or(fallback.backoff_strategy),
            base_delay: self.base_delay.or(fallback.base_delay),
            max_delay: self.max_delay.or(fallback.max_delay),
            jitter: self.jitter.or(fallback.jitter),
            retry_on: self.retry_on.or(fallback.retry_on),
            timeout: self.timeout.or(fallback.timeout),
            circuit_breaker: self.circuit_breaker.or(fallback.circuit_breaker),
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Builder for [`ResilienceConfig`].
#[derive(Debug, Clone)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self {
            config: ResilienceConfig::default(),
        }
    }

    /// Starts from a preset instead of the defaults.
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            config: preset.config(),
        }
    }

    /// Sets the number of attempts beyond the first.
    ///
    /// Default: 3
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Sets the backoff strategy.
    ///
    /// Default: exponential
    pub fn backoff_strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.config.backoff_strategy = strategy;
        self
    }

    /// Shorthand for exponential backoff from `base_delay`.
    pub fn exponential_backoff(self, base_delay: Duration) -> Self {
        self.backoff_strategy(BackoffStrategy::Exponential)
            .base_delay(base_delay)
    }

    /// Shorthand for linear backoff from `base_delay`.
    pub fn linear_backoff(self, base_delay: Duration) -> Self {
        self.backoff_strategy(BackoffStrategy::Linear)
            .base_delay(base_delay)
    }

    /// Shorthand for a fixed delay between attempts.
    pub fn fixed_backoff(self, delay: Duration) -> Self {
        self.backoff_strategy(BackoffStrategy::Fixed).base_delay(delay)
    }

    /// Sets the base delay.
    ///
    /// Default: 1 second
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    /// Sets the upper clamp for a single delay.
    ///
    /// Default: 30 seconds
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    /// Turns jitter on or off.
    ///
    /// Default: on
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.config.jitter = jitter;
        self
    }

    /// Sets the HTTP statuses that trigger a retry.
    ///
    /// Default: 408, 429, 500, 502, 503, 504
    pub fn retry_on(mut self, statuses: impl Into<StatusSet>) -> Self {
        self.config.retry_on = statuses.into();
        self
    }

    /// Sets the bound on a single attempt.
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Replaces the circuit breaker policy.
    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.config.circuit_breaker = config;
        self
    }

    /// Disables breaker tracking.
    pub fn without_circuit_breaker(mut self) -> Self {
        self.config.circuit_breaker.enabled = false;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}

impl Default for ResilienceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
