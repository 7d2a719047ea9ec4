//! Retries, backoff, timeouts and per-operation circuit breakers for
//! outbound calls.
//!
//! `callguard` decides *how reliably* to call a dependency whose availability
//! and latency you do not control. Each component is available as an
//! individual crate and as a feature of this one.
//!
//! # Components
//!
//! - **Executor** (`executor` feature, default): runs any async operation
//!   with bounded retries, backoff, a per-attempt timeout and a circuit
//!   breaker keyed by operation name, recording success and failure metrics
//! - **HTTP** (`http` feature): a `reqwest` client whose requests go through
//!   the executor and fail with enriched errors
//! - **Circuit Breaker** (`circuitbreaker` feature): the per-operation
//!   breaker registry on its own
//! - **Retry** (`retry` feature): backoff schedules and retry eligibility
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! callguard = { version = "0.3", features = ["http", "tracing"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "executor")]
//! # async fn example() {
//! use callguard::executor::{Preset, ResilienceExecutor, ResilienceOverrides};
//! use std::io;
//!
//! let executor = ResilienceExecutor::new(Preset::Critical.config());
//!
//! let token = executor
//!     .execute(
//!         || async { Ok::<_, io::Error>("token") },
//!         &ResilienceOverrides::new(),
//!         "POST /oauth/token",
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(token, "token");
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `metrics`: export counters, gauges and histograms via the `metrics` crate
//! - `tracing`: structured logs via the `tracing` crate
//! - `serde`: load configurations and presets from files
//! - `full`: every component

// Re-export core (always available)
pub use callguard_core as core;

#[cfg(feature = "circuitbreaker")]
pub use callguard_circuitbreaker as circuitbreaker;

#[cfg(feature = "retry")]
pub use callguard_retry as retry;

#[cfg(feature = "executor")]
pub use callguard_executor as executor;

#[cfg(feature = "http")]
pub use callguard_http as http;

pub use callguard_core::{FailureDetails, FailureKind, TransportCode};

#[cfg(feature = "executor")]
pub use callguard_executor::{
    ExecuteError, Preset, ResilienceConfig, ResilienceExecutor, ResilienceOverrides,
};

#[cfg(feature = "http")]
pub use callguard_http::{EnrichedError, HttpClientConfig, RequestOptions, ResilientHttpClient};
