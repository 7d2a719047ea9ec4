use rand::Rng;
use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the delay grows between retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum BackoffStrategy {
    /// `base * 2^attempt`
    #[default]
    Exponential,
    /// `base * (attempt + 1)`
    Linear,
    /// `base`
    Fixed,
}

impl BackoffStrategy {
    /// Upper-case label (`EXPONENTIAL`, `LINEAR`, `FIXED`).
    pub fn as_str(self) -> &'static str {
        match self {
            BackoffStrategy::Exponential => "EXPONENTIAL",
            BackoffStrategy::Linear => "LINEAR",
            BackoffStrategy::Fixed => "FIXED",
        }
    }
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backoff schedule: strategy, base delay, upper clamp and optional jitter.
///
/// ```
/// use callguard_retry::{Backoff, BackoffStrategy};
/// use std::time::Duration;
///
/// let backoff = Backoff::new(BackoffStrategy::Exponential, Duration::from_secs(1))
///     .max_delay(Duration::from_secs(3));
///
/// assert_eq!(backoff.delay(0), Duration::from_secs(1));
/// assert_eq!(backoff.delay(1), Duration::from_secs(2));
/// assert_eq!(backoff.delay(2), Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    strategy: BackoffStrategy,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Backoff {
    /// Creates a schedule without jitter, clamped at 30 seconds.
    pub fn new(strategy: BackoffStrategy, base_delay: Duration) -> Self {
        Self {
            strategy,
            base_delay,
            max_delay: Duration::from_secs(30),
            jitter: false,
        }
    }

    /// Sets the upper clamp applied before jitter.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Scales each delay by a uniform factor in `[0.5, 1.0]`.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// The growth strategy.
    pub fn strategy(&self) -> BackoffStrategy {
        self.strategy
    }

    // Saturates to Duration::MAX on overflow.
    fn unclamped(&self, attempt: u32) -> Duration {
        let factor = match self.strategy {
            BackoffStrategy::Exponential => 2u32.checked_pow(attempt),
            BackoffStrategy::Linear => attempt.checked_add(1),
            BackoffStrategy::Fixed => Some(1),
        };
        factor
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Deterministic delay for `attempt`: the strategy's value clamped to
    /// `max_delay`.
    pub fn raw_delay(&self, attempt: u32) -> Duration {
        self.unclamped(attempt).min(self.max_delay)
    }

    /// Delay to sleep before retry number `attempt` (0-based).
    ///
    /// With jitter enabled the raw delay is multiplied by a random factor in
    /// `[0.5, 1.0]` and floored to whole milliseconds.
    pub fn delay(&self, attempt: u32) -> Duration {
        let raw = self.raw_delay(attempt);
        if !self.jitter {
            return raw;
        }
        let factor: f64 = rand::rng().random_range(0.5..=1.0);
        apply_jitter(raw, factor)
    }
}

fn apply_jitter(raw: Duration, factor: f64) -> Duration {
    let millis = (raw.as_millis() as f64 * factor).floor();
    Duration::from_millis(millis as u64)
}
