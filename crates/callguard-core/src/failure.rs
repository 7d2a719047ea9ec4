//! Failure vocabulary.
//!
//! The executor never inspects an operation's error type directly. Instead the
//! error describes itself through [`FailureDetails`]: an HTTP status if a
//! response was received, or a [`TransportCode`] if the exchange never
//! completed. Retry eligibility and error enrichment are derived from these
//! two facts alone.

use std::fmt;
use std::io;

/// Transport-level condition observed when no response was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportCode {
    /// The peer reset the connection.
    ConnectionReset,
    /// The peer refused the connection.
    ConnectionRefused,
    /// Host name resolution failed.
    DnsFailure,
    /// The transport gave up waiting.
    TimedOut,
    /// Any other transport failure (TLS, malformed response, ...).
    Other,
}

impl TransportCode {
    /// Whether this condition is transient enough to retry.
    pub fn is_retryable(self) -> bool {
        !matches!(self, TransportCode::Other)
    }

    /// Conventional errno-style label, handy for logs and dashboards.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportCode::ConnectionReset => "ECONNRESET",
            TransportCode::ConnectionRefused => "ECONNREFUSED",
            TransportCode::DnsFailure => "ENOTFOUND",
            TransportCode::TimedOut => "ETIMEDOUT",
            TransportCode::Other => "EUNKNOWN",
        }
    }

    /// Maps an I/O error kind to a transport code, if it names one.
    pub fn from_io_kind(kind: io::ErrorKind) -> Option<Self> {
        match kind {
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                Some(TransportCode::ConnectionReset)
            }
            io::ErrorKind::ConnectionRefused => Some(TransportCode::ConnectionRefused),
            io::ErrorKind::TimedOut => Some(TransportCode::TimedOut),
            _ => None,
        }
    }
}

impl fmt::Display for TransportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The circuit breaker rejected the call; nothing was attempted.
    CircuitOpen,
    /// The attempt exceeded its time bound.
    Timeout,
    /// No response was received (reset, refused, DNS, ...).
    Transport,
    /// A response was received with an error status.
    HttpStatus,
    /// Anything else raised by the operation.
    Application,
}

impl FailureKind {
    /// Lowercase label used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::CircuitOpen => "circuit_open",
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport",
            FailureKind::HttpStatus => "http_status",
            FailureKind::Application => "application",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes a failure well enough to classify it.
///
/// Both methods default to `None`, so an application error type can opt in
/// with an empty impl and will be treated as a terminal
/// [`FailureKind::Application`] failure.
///
/// ```
/// use callguard_core::{FailureDetails, FailureKind};
///
/// #[derive(Debug)]
/// struct Upstream { status: u16 }
///
/// impl FailureDetails for Upstream {
///     fn status(&self) -> Option<u16> {
///         Some(self.status)
///     }
/// }
///
/// assert_eq!(Upstream { status: 503 }.failure_kind(), FailureKind::HttpStatus);
/// ```
pub trait FailureDetails {
    /// HTTP status of the erroneous response, if one was received.
    fn status(&self) -> Option<u16> {
        None
    }

    /// Transport condition, if no response was received.
    fn transport_code(&self) -> Option<TransportCode> {
        None
    }

    /// Classification derived from [`status`](Self::status) and
    /// [`transport_code`](Self::transport_code).
    fn failure_kind(&self) -> FailureKind {
        if self.status().is_some() {
            FailureKind::HttpStatus
        } else if self.transport_code().is_some() {
            FailureKind::Transport
        } else {
            FailureKind::Application
        }
    }
}

impl FailureDetails for io::Error {
    fn transport_code(&self) -> Option<TransportCode> {
        TransportCode::from_io_kind(self.kind())
    }
}

impl<T: FailureDetails + ?Sized> FailureDetails for Box<T> {
    fn status(&self) -> Option<u16> {
        (**self).status()
    }

    fn transport_code(&self) -> Option<TransportCode> {
        (**self).transport_code()
    }

    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}
