//! Core infrastructure for callguard.
//!
//! This crate provides the pieces shared by every callguard component:
//! - Event system for observability ([`EventListeners`], [`FnListener`])
//! - Failure vocabulary used to decide what is retryable ([`FailureDetails`],
//!   [`TransportCode`], [`FailureKind`])

pub mod events;
pub mod failure;
#[cfg(feature = "serde")]
pub mod serde_ms;

pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use failure::{FailureDetails, FailureKind, TransportCode};
