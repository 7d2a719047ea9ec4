use callguard_executor::ResilienceOverrides;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Per-call settings.
///
/// ```
/// use callguard_executor::ResilienceOverrides;
/// use callguard_http::RequestOptions;
/// use reqwest::header::{HeaderName, HeaderValue};
///
/// let options = RequestOptions::new()
///     .header(
///         HeaderName::from_static("x-request-id"),
///         HeaderValue::from_static("42"),
///     )
///     .resilience(ResilienceOverrides::new().max_retries(0))
///     .operation_name("create-company");
///
/// assert_eq!(options.operation_name.as_deref(), Some("create-company"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers; these win over the client's default headers.
    pub headers: HeaderMap,
    /// Transport timeout for this request.
    pub timeout: Option<Duration>,
    /// Overrides merged over the client's resilience configuration.
    pub resilience: Option<ResilienceOverrides>,
    /// Key for the circuit breaker and metrics records.
    /// Defaults to `"<METHOD> <url>"`.
    pub operation_name: Option<String>,
}

impl RequestOptions {
    /// Options that change nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one header, replacing any earlier value for `name`.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds every header in `headers`.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets the transport timeout for this request.
    ///
    /// Default: the client's transport timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets resilience overrides for this request only.
    pub fn resilience(mut self, overrides: ResilienceOverrides) -> Self {
        self.resilience = Some(overrides);
        self
    }

    /// Sets the breaker and metrics key.
    ///
    /// Default: `"<METHOD> <url>"`
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}
