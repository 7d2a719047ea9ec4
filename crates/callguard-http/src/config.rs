use callguard_executor::{Preset, ResilienceConfig, ResilienceOverrides};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Client-wide settings for [`ResilientHttpClient`](crate::ResilientHttpClient).
#[derive(Debug, Clone, Default)]
pub struct HttpClientConfig {
    /// Prefix for relative request URLs.
    pub base_url: Option<String>,
    /// Headers sent with every request; per-call headers win.
    pub default_headers: HeaderMap,
    /// Transport timeout for a whole request. The resilience timeout bounds
    /// each attempt regardless.
    pub timeout: Option<Duration>,
    /// Resilience configuration every call starts from.
    pub resilience: ResilienceConfig,
}

impl HttpClientConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::new()
    }
}

/// Builder for [`HttpClientConfig`].
///
/// ```
/// use callguard_executor::{Preset, ResilienceOverrides};
/// use callguard_http::HttpClientConfig;
///
/// let config = HttpClientConfig::builder()
///     .base_url("https://api.example.com/v1")
///     .preset(Preset::Critical)
///     .resilience_overrides(ResilienceOverrides::new().max_retries(2))
///     .build();
///
/// assert_eq!(config.resilience.max_retries, 2);
/// assert_eq!(config.resilience.circuit_breaker.failure_threshold, 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpClientConfigBuilder {
    base_url: Option<String>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    resilience: ResilienceConfig,
    overrides: ResilienceOverrides,
}

impl HttpClientConfigBuilder {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix for relative request URLs.
    ///
    /// Default: none (URLs must be absolute)
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a header sent with every request.
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Adds several headers sent with every request.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Sets the transport timeout for a whole request.
    ///
    /// Default: none
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the resilience configuration.
    ///
    /// Default: [`ResilienceConfig::default()`]
    pub fn resilience(mut self, config: ResilienceConfig) -> Self {
        self.resilience = config;
        self
    }

    /// Starts the resilience configuration from a preset.
    pub fn preset(self, preset: Preset) -> Self {
        self.resilience(preset.config())
    }

    /// Applies overrides on top of the resilience configuration at build
    /// time. Repeated calls layer, later ones winning.
    pub fn resilience_overrides(mut self, overrides: ResilienceOverrides) -> Self {
        self.overrides = overrides.or(self.overrides);
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> HttpClientConfig {
        HttpClientConfig {
            base_url: self.base_url,
            default_headers: self.default_headers,
            timeout: self.timeout,
            resilience: self.resilience.merge(&self.overrides),
        }
    }
}
