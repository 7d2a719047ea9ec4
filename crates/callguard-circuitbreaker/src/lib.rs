//! Per-operation circuit breakers.
//!
//! A circuit breaker stops calling a dependency that keeps failing, giving it
//! time to recover instead of piling more load onto it.
//!
//! ## States
//! - **Closed**: normal operation, every call is admitted
//! - **Open**: calls are rejected immediately until the reset timeout elapses
//! - **Half-Open**: a single probe call is admitted; its outcome decides
//!   whether the circuit closes again or re-opens
//!
//! Circuits live in a [`CircuitBreakerRegistry`] keyed by operation name, so
//! `GET /users` tripping has no effect on `POST /orders`. The policy is a
//! plain [`CircuitBreakerConfig`] value passed with each call.
//!
//! ```rust
//! use callguard_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
//! use std::time::Duration;
//!
//! let registry = CircuitBreakerRegistry::builder()
//!     .on_state_transition(|operation, from, to| {
//!         println!("{operation}: {from} -> {to}");
//!     })
//!     .build();
//!
//! let config = CircuitBreakerConfig::builder()
//!     .failure_threshold(2)
//!     .reset_timeout(Duration::from_secs(30))
//!     .build();
//!
//! for _ in 0..2 {
//!     assert!(registry.try_acquire("GET /users", &config));
//!     registry.record_failure("GET /users", &config);
//! }
//!
//! assert_eq!(registry.state("GET /users"), CircuitState::Open);
//! assert!(!registry.try_acquire("GET /users", &config));
//! assert!(registry.try_acquire("POST /orders", &config));
//! ```
//!
//! ## Feature Flags
//! - `metrics`: state transition counters, a state gauge and call outcome
//!   counters via the `metrics` crate
//! - `tracing`: logs transitions at info level and admissions at trace level
//! - `serde`: `Serialize`/`Deserialize` for the configuration types

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

pub use circuit::{CircuitSnapshot, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerOverrides};
pub use events::CircuitBreakerEvent;
pub use registry::{CircuitBreakerRegistry, CircuitBreakerRegistryBuilder};

mod circuit;
mod config;
mod events;
mod registry;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

pub(crate) fn describe_metrics() {
    #[cfg(feature = "metrics")]
    {
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "circuitbreaker_calls_total",
                "Total number of calls seen by the circuit breaker, by outcome"
            );
            describe_counter!(
                "circuitbreaker_transitions_total",
                "Total number of circuit breaker state transitions"
            );
            describe_gauge!(
                "circuitbreaker_state",
                "Circuit breaker state (1 for the current state, 0 otherwise)"
            );
        });
    }
}
