//! Resilience executor for outbound calls.
//!
//! [`ResilienceExecutor`] wraps any asynchronous operation with:
//!
//! - **Retries** with exponential, linear or fixed backoff, clamped and
//!   optionally jittered
//! - **A per-attempt timeout**; an attempt that runs over is cancelled and
//!   ends the call with [`ExecuteError::Timeout`], which is not retried
//! - **A circuit breaker per operation name**, checked once before the first
//!   attempt and fed by every attempt
//! - **Attempt metrics per operation name**, queryable at runtime
//!
//! Operations report what went wrong through
//! [`FailureDetails`](callguard_core::FailureDetails): a failure is retried
//! when it carries an HTTP status listed in
//! [`retry_on`](ResilienceConfig::retry_on) or a recognized transport
//! condition. Anything else is returned after a single attempt.
//!
//! # Example
//!
//! ```rust
//! use callguard_executor::{Preset, ResilienceExecutor, ResilienceOverrides};
//! use std::io;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let executor = ResilienceExecutor::builder()
//!     .config(Preset::Query)
//!     .on_retry(|operation, attempt, delay| {
//!         println!("{operation}: retry {attempt} in {delay:?}");
//!     })
//!     .build();
//!
//! let overrides = ResilienceOverrides::new()
//!     .max_retries(1)
//!     .base_delay(Duration::from_millis(1));
//!
//! let result = executor
//!     .execute(
//!         || async { Err::<(), _>(io::Error::from(io::ErrorKind::ConnectionRefused)) },
//!         &overrides,
//!         "GET /health",
//!     )
//!     .await;
//!
//! assert!(result.is_err());
//! assert_eq!(executor.metrics().get("GET /health").failures, 2);
//! # }
//! ```
//!
//! # Registries
//!
//! Circuit and metrics records are keyed by the operation name supplied with
//! each call and live in [`CircuitBreakerRegistry`] and [`MetricsRegistry`].
//! Both are owned by the executor (and shared by its clones) unless injected
//! through the builder, so independently built executors never share state.
//!
//! # Feature Flags
//!
//! - `metrics`: call, attempt, retry and timeout counters plus an attempts
//!   histogram via the `metrics` crate
//! - `tracing`: structured logs for attempts, retries, timeouts and rejections
//! - `serde`: `Serialize`/`Deserialize` for configuration, overrides, presets
//!   and metrics records

#[cfg(feature = "metrics")]
use std::sync::Once;

pub use callguard_circuitbreaker::{
    CircuitBreakerConfig, CircuitBreakerOverrides, CircuitBreakerRegistry, CircuitSnapshot,
    CircuitState,
};
pub use callguard_retry::{BackoffStrategy, StatusSet};
pub use config::{ResilienceConfig, ResilienceConfigBuilder, ResilienceOverrides};
pub use error::ExecuteError;
pub use events::ExecutorEvent;
pub use executor::{ResilienceExecutor, ResilienceExecutorBuilder};
pub use crate::metrics::{MetricsRegistry, OperationMetrics};
pub use presets::{Preset, UnknownPreset};

mod config;
mod error;
mod events;
mod executor;
mod metrics;
mod presets;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

pub(crate) fn describe_metrics() {
    #[cfg(feature = "metrics")]
    {
        METRICS_INIT.call_once(|| {
            ::metrics::describe_counter!(
                "executor_calls_total",
                "Total number of executed calls (success, failure, or rejected)"
            );
            ::metrics::describe_counter!(
                "executor_attempts_total",
                "Total number of attempts, including retries"
            );
            ::metrics::describe_counter!(
                "executor_retries_total",
                "Total number of retries scheduled"
            );
            ::metrics::describe_counter!(
                "executor_timeouts_total",
                "Total number of attempts that exceeded their timeout"
            );
            ::metrics::describe_histogram!(
                "executor_attempts",
                "Attempts made per completed call"
            );
        });
    }
}
