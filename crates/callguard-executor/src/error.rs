use callguard_core::{FailureDetails, FailureKind, TransportCode};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`ResilienceExecutor::execute`](crate::ResilienceExecutor::execute).
#[derive(Debug, Error)]
pub enum ExecuteError<E> {
    /// The circuit for the operation is open; nothing was attempted.
    #[error("circuit breaker is open for `{operation}`")]
    CircuitOpen { operation: String },

    /// The last attempt exceeded its time bound.
    #[error("`{operation}` timed out after {}ms", .timeout.as_millis())]
    Timeout { operation: String, timeout: Duration },

    /// The last error returned by the operation.
    #[error("{0}")]
    Operation(E),
}

impl<E> ExecuteError<E> {
    /// Returns true if the call was short-circuited by an open breaker.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ExecuteError::CircuitOpen { .. })
    }

    /// Returns true if the last attempt timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecuteError::Timeout { .. })
    }

    /// Returns the operation's error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            ExecuteError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Borrows the operation's error if present.
    pub fn inner(&self) -> Option<&E> {
        match self {
            ExecuteError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: FailureDetails> ExecuteError<E> {
    /// Classification of the failure.
    pub fn kind(&self) -> FailureKind {
        self.failure_kind()
    }
}

impl<E: FailureDetails> FailureDetails for ExecuteError<E> {
    fn status(&self) -> Option<u16> {
        self.inner().and_then(FailureDetails::status)
    }

    // The executor's own timeout carries no transport code, so it is never
    // retried. A timeout reported by the operation itself keeps its code.
    fn transport_code(&self) -> Option<TransportCode> {
        match self {
            ExecuteError::Operation(e) => e.transport_code(),
            ExecuteError::Timeout { .. } | ExecuteError::CircuitOpen { .. } => None,
        }
    }

    fn failure_kind(&self) -> FailureKind {
        match self {
            ExecuteError::CircuitOpen { .. } => FailureKind::CircuitOpen,
            ExecuteError::Timeout { .. } => FailureKind::Timeout,
            ExecuteError::Operation(e) => e.failure_kind(),
        }
    }
}
