use crate::backoff::Backoff;
use crate::status::StatusSet;
use callguard_core::FailureDetails;
use std::time::Duration;

/// Policy for retry behavior.
///
/// Combines the retry budget, the backoff schedule and the set of HTTP
/// statuses worth retrying. Transport failures with a recognized
/// [`TransportCode`](callguard_core::TransportCode) are always retryable;
/// everything else is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Backoff,
    retry_on: StatusSet,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(max_retries: u32, backoff: Backoff, retry_on: StatusSet) -> Self {
        Self {
            max_retries,
            backoff,
            retry_on,
        }
    }

    /// Attempts beyond the first.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// The schedule [`next_backoff`](Self::next_backoff) reads from.
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// HTTP statuses worth another attempt.
    pub fn retry_on(&self) -> &StatusSet {
        &self.retry_on
    }

    /// Whether `error` describes a transient failure.
    pub fn is_retryable<E: FailureDetails + ?Sized>(&self, error: &E) -> bool {
        if let Some(status) = error.status() {
            return self.retry_on.contains(status);
        }
        error
            .transport_code()
            .is_some_and(|code| code.is_retryable())
    }

    /// Whether a failure on `attempt` (0-based) should be followed by another
    /// attempt.
    pub fn should_retry<E: FailureDetails + ?Sized>(&self, error: &E, attempt: u32) -> bool {
        attempt < self.max_retries && self.is_retryable(error)
    }

    /// Computes the delay before retry number `attempt` (0-based).
    pub fn next_backoff(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}
