use bytes::Bytes;
use callguard_core::{FailureDetails, FailureKind, TransportCode};
use callguard_executor::ExecuteError;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::error::Error as StdError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Failure of a single HTTP attempt, before enrichment.
#[derive(Debug, Error)]
pub enum HttpFailure {
    /// A response arrived with a non-2xx status.
    #[error("HTTP {} {}", .status.as_u16(), .status.canonical_reason().unwrap_or(""))]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },

    /// No response was received.
    #[error("{code}: {source}")]
    Transport {
        code: TransportCode,
        #[source]
        source: reqwest::Error,
    },

    /// The request body could not be serialized; nothing was sent.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl HttpFailure {
    pub(crate) fn transport(source: reqwest::Error) -> Self {
        HttpFailure::Transport {
            code: classify_transport(&source),
            source,
        }
    }
}

impl FailureDetails for HttpFailure {
    fn status(&self) -> Option<u16> {
        match self {
            HttpFailure::Status { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }

    fn transport_code(&self) -> Option<TransportCode> {
        match self {
            HttpFailure::Transport { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Maps a `reqwest` error to a transport code by inspecting its source chain.
pub(crate) fn classify_transport(err: &reqwest::Error) -> TransportCode {
    if err.is_timeout() {
        return TransportCode::TimedOut;
    }

    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if let Some(code) = TransportCode::from_io_kind(io_err.kind()) {
                return code;
            }
        }
        if cause.to_string().contains("dns error") {
            return TransportCode::DnsFailure;
        }
        source = cause.source();
    }

    TransportCode::Other
}

/// The error returned by every [`ResilientHttpClient`](crate::ResilientHttpClient)
/// call.
///
/// Carries the request that failed, when it failed, and whatever is known
/// about the failure: the response status, headers and body for HTTP errors,
/// or a transport code when no response arrived.
#[derive(Debug)]
pub struct EnrichedError {
    kind: FailureKind,
    method: Method,
    url: String,
    timestamp: DateTime<Utc>,
    retryable: bool,
    cause: ExecuteError<HttpFailure>,
}

impl EnrichedError {
    pub(crate) fn new(
        cause: ExecuteError<HttpFailure>,
        method: Method,
        url: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            kind: cause.kind(),
            method,
            url: url.into(),
            timestamp: Utc::now(),
            retryable,
            cause,
        }
    }

    /// Classification of the final failure.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Response status, for HTTP status failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self.cause.inner() {
            Some(HttpFailure::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Canonical reason phrase of [`status`](Self::status).
    pub fn status_text(&self) -> Option<&'static str> {
        self.status().and_then(|status| status.canonical_reason())
    }

    /// Response headers, for HTTP status failures.
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self.cause.inner() {
            Some(HttpFailure::Status { headers, .. }) => Some(headers),
            _ => None,
        }
    }

    /// Response body, for HTTP status failures.
    pub fn body(&self) -> Option<&Bytes> {
        match self.cause.inner() {
            Some(HttpFailure::Status { body, .. }) => Some(body),
            _ => None,
        }
    }

    /// Transport condition, when no response arrived. An attempt cut off by
    /// the resilience timeout has no code; see [`is_timeout`](Self::is_timeout).
    pub fn code(&self) -> Option<TransportCode> {
        self.cause.transport_code()
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The resolved request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// When the error was built.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// [`timestamp`](Self::timestamp) as ISO-8601 with millisecond precision.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn is_circuit_open(&self) -> bool {
        self.cause.is_circuit_open()
    }

    /// True for the resilience timeout and for transport timeouts alike.
    pub fn is_timeout(&self) -> bool {
        self.cause.is_timeout() || self.code() == Some(TransportCode::TimedOut)
    }

    /// Whether the final failure was one the client's policy would retry.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// The executor error this was built from.
    pub fn cause(&self) -> &ExecuteError<HttpFailure> {
        &self.cause
    }

    pub fn into_cause(self) -> ExecuteError<HttpFailure> {
        self.cause
    }
}

impl fmt::Display for EnrichedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} failed: {}", self.method, self.url, self.cause)
    }
}

impl StdError for EnrichedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.cause {
            ExecuteError::Operation(failure) => Some(failure),
            _ => None,
        }
    }
}

impl FailureDetails for EnrichedError {
    fn status(&self) -> Option<u16> {
        self.cause.status()
    }

    fn transport_code(&self) -> Option<TransportCode> {
        self.cause.transport_code()
    }

    fn failure_kind(&self) -> FailureKind {
        self.kind
    }
}
