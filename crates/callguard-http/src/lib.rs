//! Resilient HTTP client.
//!
//! [`ResilientHttpClient`] adapts the callguard executor to HTTP verbs on top
//! of `reqwest`. Every request is one executor operation:
//!
//! - the operation name defaults to `"<METHOD> <url>"`, so breaker state and
//!   metrics are tracked per endpoint
//! - non-2xx responses are failures, retried when their status is listed in
//!   the configuration's `retry_on`
//! - connection resets, refusals, DNS failures and transport timeouts are
//!   retried; an attempt cut off by the resilience `timeout` is not
//! - the final failure is returned as an [`EnrichedError`] carrying the
//!   method, URL, timestamp and either the response (status, headers, body)
//!   or the transport code
//!
//! Relative URLs are joined to the configured base URL; absolute `http://`
//! and `https://` URLs are used as given.
//!
//! # Feature Flags
//!
//! - `metrics`: `http_client_requests_total{method, outcome}` plus the
//!   executor's metrics
//! - `tracing`: request outcome logs plus the executor's logs

pub use client::ResilientHttpClient;
pub use config::{HttpClientConfig, HttpClientConfigBuilder};
pub use error::{EnrichedError, HttpFailure};
pub use request::RequestOptions;
pub use response::HttpResponse;

pub use reqwest::{header, Method, StatusCode};

mod client;
mod config;
mod error;
mod request;
mod response;

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

pub(crate) fn describe_metrics() {
    #[cfg(feature = "metrics")]
    {
        METRICS_INIT.call_once(|| {
            metrics::describe_counter!(
                "http_client_requests_total",
                "Total number of HTTP client requests by method and outcome"
            );
        });
    }
}
