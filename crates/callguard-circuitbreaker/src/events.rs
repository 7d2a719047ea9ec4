use crate::circuit::CircuitState;
use callguard_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by the circuit breaker registry.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The circuit for `operation` moved between states.
    StateTransition {
        operation: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A call was admitted.
    CallPermitted {
        operation: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was short-circuited.
    CallRejected {
        operation: String,
        timestamp: Instant,
    },
    /// A success was recorded.
    SuccessRecorded {
        operation: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A failure was recorded.
    FailureRecorded {
        operation: String,
        timestamp: Instant,
        state: CircuitState,
        failure_count: u32,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn operation(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { operation, .. }
            | CircuitBreakerEvent::CallPermitted { operation, .. }
            | CircuitBreakerEvent::CallRejected { operation, .. }
            | CircuitBreakerEvent::SuccessRecorded { operation, .. }
            | CircuitBreakerEvent::FailureRecorded { operation, .. } => operation,
        }
    }
}
