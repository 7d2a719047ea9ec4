use crate::config::HttpClientConfig;
use crate::error::{EnrichedError, HttpFailure};
use crate::request::RequestOptions;
use crate::response::HttpResponse;
use bytes::Bytes;
use callguard_executor::{
    CircuitState, ExecuteError, OperationMetrics, ResilienceConfig, ResilienceExecutor,
};
#[cfg(feature = "metrics")]
use metrics::counter;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// HTTP client whose requests run through a [`ResilienceExecutor`].
///
/// Each call is one executor operation keyed by its operation name, so its
/// retries, timeout and circuit breaker apply per endpoint. Cloning is cheap
/// and clones share connections, registries and configuration.
///
/// ```no_run
/// use callguard_executor::Preset;
/// use callguard_http::{HttpClientConfig, RequestOptions, ResilientHttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ResilientHttpClient::new(
///     HttpClientConfig::builder()
///         .base_url("https://api.example.com")
///         .preset(Preset::Query)
///         .build(),
/// )?;
///
/// let response = client.get("/companies", RequestOptions::new()).await?;
/// println!("{}", response.text());
///
/// let stats = client.operation_metrics("GET /companies");
/// println!("{} ok, {} failed", stats.successes, stats.failures);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ResilientHttpClient {
    http: reqwest::Client,
    config: Arc<HttpClientConfig>,
    executor: ResilienceExecutor,
}

impl ResilientHttpClient {
    /// Creates a client with its own executor and registries.
    pub fn new(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let executor = ResilienceExecutor::new(config.resilience.clone());
        Self::with_executor(config, executor)
    }

    /// Creates a client that records into `executor`'s registries.
    ///
    /// The client's own resilience configuration still governs its calls.
    pub fn with_executor(
        config: HttpClientConfig,
        executor: ResilienceExecutor,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::from_parts(builder.build()?, config, executor))
    }

    /// Assembles a client from an existing `reqwest::Client`.
    pub fn from_parts(
        http: reqwest::Client,
        config: HttpClientConfig,
        executor: ResilienceExecutor,
    ) -> Self {
        crate::describe_metrics();
        Self {
            http,
            config: Arc::new(config),
            executor,
        }
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// The executor every request runs through. Clients built with
    /// [`with_executor`](Self::with_executor) may share it.
    pub fn executor(&self) -> &ResilienceExecutor {
        &self.executor
    }

    /// Attempt counters for every operation name seen so far.
    pub fn metrics(&self) -> HashMap<String, OperationMetrics> {
        self.executor.metrics().all()
    }

    /// Attempt counters for `name`; zeroed if it was never called.
    pub fn operation_metrics(&self, name: &str) -> OperationMetrics {
        self.executor.metrics().get(name)
    }

    /// Breaker state for `name`; [`CircuitState::Closed`] if never seen.
    pub fn circuit_state(&self, name: &str) -> CircuitState {
        self.executor.circuit_state(name)
    }

    /// Forces the breaker for `name` back to Closed with no failures.
    pub fn reset_circuit(&self, name: &str) {
        self.executor.reset_circuit(name)
    }

    /// Sends a GET request to `url`, absolute or relative to the base URL.
    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<HttpResponse, EnrichedError> {
        self.request(Method::GET, url, None, options).await
    }

    /// Sends a DELETE request to `url`.
    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<HttpResponse, EnrichedError> {
        self.request(Method::DELETE, url, None, options).await
    }

    /// Sends `body` as JSON.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<HttpResponse, EnrichedError> {
        self.json_request(Method::POST, url, body, options).await
    }

    /// Sends `body` as JSON.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<HttpResponse, EnrichedError> {
        self.json_request(Method::PUT, url, body, options).await
    }

    /// Sends `body` as JSON.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<HttpResponse, EnrichedError> {
        self.json_request(Method::PATCH, url, body, options).await
    }

    async fn json_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        mut options: RequestOptions,
    ) -> Result<HttpResponse, EnrichedError> {
        let body = match serde_json::to_vec(body) {
            Ok(body) => Bytes::from(body),
            Err(err) => {
                return Err(EnrichedError::new(
                    ExecuteError::Operation(HttpFailure::Serialize(err)),
                    method,
                    self.resolve_url(url),
                    false,
                ))
            }
        };
        if !options.headers.contains_key(CONTENT_TYPE)
            && !self.config.default_headers.contains_key(CONTENT_TYPE)
        {
            options
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        self.request(method, url, Some(body), options).await
    }

    /// Sends a request with an optional raw body.
    ///
    /// Non-2xx responses are failures. Every attempt is recorded under the
    /// operation name, which defaults to `"<METHOD> <url>"` with `url` as
    /// passed here.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> Result<HttpResponse, EnrichedError> {
        let full_url = self.resolve_url(url);
        let name = options
            .operation_name
            .clone()
            .unwrap_or_else(|| format!("{method} {url}"));
        let config = match &options.resilience {
            Some(overrides) => self.config.resilience.merge(overrides),
            None => self.config.resilience.clone(),
        };
        let headers = self.merged_headers(&options.headers);

        let result = self
            .executor
            .execute_with(
                &config,
                || {
                    let mut request = self
                        .http
                        .request(method.clone(), full_url.as_str())
                        .headers(headers.clone());
                    if let Some(body) = &body {
                        request = request.body(body.clone());
                    }
                    if let Some(timeout) = options.timeout {
                        request = request.timeout(timeout);
                    }
                    send(request)
                },
                &name,
            )
            .await;

        match result {
            Ok(response) => {
                #[cfg(feature = "metrics")]
                counter!("http_client_requests_total", "method" => method.to_string(), "outcome" => "success")
                    .increment(1);

                #[cfg(feature = "tracing")]
                debug!(
                    method = %method,
                    url = %full_url,
                    status = response.status().as_u16(),
                    "Request succeeded"
                );

                Ok(response)
            }
            Err(err) => {
                let retryable = config.retry_policy().is_retryable(&err);
                let enriched = EnrichedError::new(err, method, full_url, retryable);

                #[cfg(feature = "metrics")]
                counter!(
                    "http_client_requests_total",
                    "method" => enriched.method().to_string(),
                    "outcome" => enriched.kind().as_str()
                )
                .increment(1);

                #[cfg(feature = "tracing")]
                warn!(
                    method = %enriched.method(),
                    url = enriched.url(),
                    status = enriched.status().map(|s| s.as_u16()),
                    kind = %enriched.kind(),
                    "Request failed"
                );

                Err(enriched)
            }
        }
    }

    fn resolve_url(&self, url: &str) -> String {
        join_url(self.config.base_url.as_deref(), url)
    }

    fn merged_headers(&self, call: &HeaderMap) -> HeaderMap {
        let mut headers = self.config.default_headers.clone();
        for (name, value) in call {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    /// The resilience configuration calls start from.
    pub fn resilience(&self) -> &ResilienceConfig {
        &self.config.resilience
    }
}

impl std::fmt::Debug for ResilientHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientHttpClient")
            .field("base_url", &self.config.base_url)
            .field("executor", &self.executor)
            .finish()
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<HttpResponse, HttpFailure> {
    let response = request.send().await.map_err(HttpFailure::transport)?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(HttpFailure::transport)?;

    if status.is_success() {
        Ok(HttpResponse::new(status, headers, body))
    } else {
        Err(HttpFailure::Status {
            status,
            headers,
            body,
        })
    }
}

/// Absolute URLs pass through; anything else is appended to `base` with
/// exactly one `/` between them.
pub(crate) fn join_url(base: Option<&str>, url: &str) -> String {
    if is_absolute(url) {
        return url.to_owned();
    }
    match base {
        Some(base) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
        None => url.to_owned(),
    }
}

fn is_absolute(url: &str) -> bool {
    let has_scheme = |scheme: &str| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    };
    has_scheme("http://") || has_scheme("https://")
}
