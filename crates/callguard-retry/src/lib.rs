//! Backoff schedules and retry eligibility.
//!
//! This crate holds the pure parts of retrying: how long to wait before the
//! next attempt and whether a failure is worth another attempt at all. The
//! loop that actually sleeps and re-invokes lives in `callguard-executor`.
//!
//! # Features
//!
//! - **Backoff schedules**: [`Backoff`] with exponential, linear or fixed
//!   growth, an upper clamp and optional jitter
//! - **Retry eligibility**: [`RetryPolicy`] retries HTTP statuses listed in a
//!   [`StatusSet`] and recognized transport failures
//!
//! # Examples
//!
//! ```
//! use callguard_retry::{Backoff, BackoffStrategy, RetryPolicy, StatusSet};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(
//!     3,
//!     Backoff::new(BackoffStrategy::Linear, Duration::from_millis(500))
//!         .max_delay(Duration::from_secs(5)),
//!     StatusSet::transient(),
//! );
//!
//! assert_eq!(policy.next_backoff(0), Duration::from_millis(500));
//! assert_eq!(policy.next_backoff(2), Duration::from_millis(1500));
//! assert_eq!(policy.max_attempts(), 4);
//! ```

mod backoff;
mod policy;
mod status;

pub use backoff::{Backoff, BackoffStrategy};
pub use policy::RetryPolicy;
pub use status::StatusSet;
