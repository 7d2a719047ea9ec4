use callguard_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the resilience executor.
#[derive(Debug, Clone)]
pub enum ExecutorEvent {
    /// A retry is about to be made after `delay`.
    Retry {
        operation: String,
        timestamp: Instant,
        attempt: u32,
        delay: Duration,
    },
    /// The call succeeded (either on first try or after retries).
    Success {
        operation: String,
        timestamp: Instant,
        attempts: u32,
    },
    /// The call failed after exhausting all retry attempts.
    Error {
        operation: String,
        timestamp: Instant,
        attempts: u32,
    },
    /// A failure was not retried because it is not transient.
    IgnoredError {
        operation: String,
        timestamp: Instant,
    },
    /// An attempt exceeded its time bound.
    Timeout {
        operation: String,
        timestamp: Instant,
        timeout: Duration,
    },
    /// The call was rejected by an open circuit.
    Rejected {
        operation: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for ExecutorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExecutorEvent::Retry { .. } => "retry",
            ExecutorEvent::Success { .. } => "success",
            ExecutorEvent::Error { .. } => "error",
            ExecutorEvent::IgnoredError { .. } => "ignored_error",
            ExecutorEvent::Timeout { .. } => "timeout",
            ExecutorEvent::Rejected { .. } => "rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ExecutorEvent::Retry { timestamp, .. }
            | ExecutorEvent::Success { timestamp, .. }
            | ExecutorEvent::Error { timestamp, .. }
            | ExecutorEvent::IgnoredError { timestamp, .. }
            | ExecutorEvent::Timeout { timestamp, .. }
            | ExecutorEvent::Rejected { timestamp, .. } => *timestamp,
        }
    }

    fn operation(&self) -> &str {
        match self {
            ExecutorEvent::Retry { operation, .. }
            | ExecutorEvent::Success { operation, .. }
            | ExecutorEvent::Error { operation, .. }
            | ExecutorEvent::IgnoredError { operation, .. }
            | ExecutorEvent::Timeout { operation, .. }
            | ExecutorEvent::Rejected { operation, .. } => operation,
        }
    }
}
