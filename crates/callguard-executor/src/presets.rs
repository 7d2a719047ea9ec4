//! Named configuration templates.
//!
//! | preset | retries | backoff | base / max | jitter | timeout | breaker |
//! |---|---|---|---|---|---|---|
//! | `Critical` | 5 | exponential | 500ms / 10s | yes | 10s | 3 failures, 30s |
//! | `Auth` | 3 | exponential | 1s / 10s | yes | 15s | 5 failures, 60s |
//! | `Query` | 3 | linear | 500ms / 5s | no | 20s | off |
//! | `Notification` | 4 | exponential | 2s / 60s | yes | 30s | 10 failures, 120s |
//!
//! All presets retry on 408, 429, 500, 502, 503 and 504.

use crate::config::ResilienceConfig;
use callguard_circuitbreaker::CircuitBreakerConfig;
use callguard_retry::{BackoffStrategy, StatusSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named [`ResilienceConfig`] template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Preset {
    /// Calls whose failure blocks the business flow: many fast retries and an
    /// eager breaker.
    Critical,
    /// Token and identity endpoints.
    Auth,
    /// Idempotent reads: linear backoff, no breaker.
    Query,
    /// Fire-and-forget deliveries that can wait.
    Notification,
}

impl Preset {
    /// Every preset, in declaration order.
    pub const ALL: [Preset; 4] = [
        Preset::Critical,
        Preset::Auth,
        Preset::Query,
        Preset::Notification,
    ];

    /// Lowercase name (`critical`, `auth`, `query`, `notification`).
    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Critical => "critical",
            Preset::Auth => "auth",
            Preset::Query => "query",
            Preset::Notification => "notification",
        }
    }

    /// Builds the template.
    pub fn config(self) -> ResilienceConfig {
        match self {
            Preset::Critical => template(
                5,
                BackoffStrategy::Exponential,
                (500, 10_000),
                true,
                10_000,
                breaker(3, 30_000),
            ),
            Preset::Auth => template(
                3,
                BackoffStrategy::Exponential,
                (1_000, 10_000),
                true,
                15_000,
                breaker(5, 60_000),
            ),
            Preset::Query => template(
                3,
                BackoffStrategy::Linear,
                (500, 5_000),
                false,
                20_000,
                CircuitBreakerConfig::disabled(),
            ),
            Preset::Notification => template(
                4,
                BackoffStrategy::Exponential,
                (2_000, 60_000),
                true,
                30_000,
                breaker(10, 120_000),
            ),
        }
    }
}

fn template(
    max_retries: u32,
    backoff_strategy: BackoffStrategy,
    (base_ms, max_ms): (u64, u64),
    jitter: bool,
    timeout_ms: u64,
    circuit_breaker: CircuitBreakerConfig,
) -> ResilienceConfig {
    ResilienceConfig {
        max_retries,
        backoff_strategy,
        base_delay: Duration::from_millis(base_ms),
        max_delay: Duration::from_millis(max_ms),
        jitter,
        retry_on: StatusSet::transient(),
        timeout: Duration::from_millis(timeout_ms),
        circuit_breaker,
    }
}

fn breaker(failure_threshold: u32, reset_ms: u64) -> CircuitBreakerConfig {
    CircuitBreakerConfig::builder()
        .failure_threshold(failure_threshold)
        .reset_timeout(Duration::from_millis(reset_ms))
        .build()
}

impl From<Preset> for ResilienceConfig {
    fn from(preset: Preset) -> Self {
        preset.config()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unrecognized preset name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resilience preset `{0}`")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPreset(s.to_owned()))
    }
}
