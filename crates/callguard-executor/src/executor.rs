use crate::config::{ResilienceConfig, ResilienceOverrides};
use crate::error::ExecuteError;
use crate::events::ExecutorEvent;
use crate::metrics::MetricsRegistry;
use callguard_circuitbreaker::{CircuitBreakerRegistry, CircuitState};
use callguard_core::{EventListeners, FailureDetails, FnListener};
#[cfg(feature = "metrics")]
use metrics::{counter, histogram};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Runs operations with retries, backoff, a per-attempt timeout and a
/// per-operation circuit breaker.
///
/// Cloning is cheap; clones share the base configuration, both registries and
/// the listeners.
#[derive(Clone)]
pub struct ResilienceExecutor {
    inner: Arc<Inner>,
}

struct Inner {
    config: ResilienceConfig,
    circuit_breakers: Arc<CircuitBreakerRegistry>,
    metrics: Arc<MetricsRegistry>,
    listeners: EventListeners<ExecutorEvent>,
}

impl ResilienceExecutor {
    /// Creates an executor with fresh registries and no listeners.
    pub fn new(config: ResilienceConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Returns a builder.
    pub fn builder() -> ResilienceExecutorBuilder {
        ResilienceExecutorBuilder::new()
    }

    /// Base configuration that per-call overrides are merged over.
    pub fn config(&self) -> &ResilienceConfig {
        &self.inner.config
    }

    /// The attempt counters.
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.inner.metrics
    }

    /// The circuit breaker registry.
    pub fn circuit_breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.inner.circuit_breakers
    }

    /// Current circuit state for `operation`.
    pub fn circuit_state(&self, operation: &str) -> CircuitState {
        self.inner.circuit_breakers.state(operation)
    }

    /// Forces `operation`'s circuit closed.
    pub fn reset_circuit(&self, operation: &str) {
        self.inner.circuit_breakers.reset(operation)
    }

    /// Runs `operation` under the base configuration merged with `overrides`.
    ///
    /// `operation` is invoked once per attempt and must produce a fresh
    /// future each time. The returned error is the last one observed, or
    /// [`ExecuteError::CircuitOpen`] if the breaker rejected the call before
    /// any attempt.
    ///
    /// ```
    /// use callguard_executor::{ResilienceConfig, ResilienceExecutor, ResilienceOverrides};
    /// use std::io;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let executor = ResilienceExecutor::new(ResilienceConfig::default());
    ///
    /// let value = executor
    ///     .execute(
    ///         || async { Ok::<_, io::Error>(42) },
    ///         &ResilienceOverrides::new(),
    ///         "answer",
    ///     )
    ///     .await
    ///     .unwrap();
    ///
    /// assert_eq!(value, 42);
    /// assert_eq!(executor.metrics().get("answer").successes, 1);
    /// # }
    /// ```
    pub async fn execute<T, E, F, Fut>(
        &self,
        operation: F,
        overrides: &ResilienceOverrides,
        name: &str,
    ) -> Result<T, ExecuteError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: FailureDetails + fmt::Display,
    {
        let config = self.inner.config.merge(overrides);
        self.execute_with(&config, operation, name).await
    }

    /// Runs `operation` under `config`, ignoring the base configuration.
    ///
    /// Registries and listeners are still the executor's own.
    pub async fn execute_with<T, E, F, Fut>(
        &self,
        config: &ResilienceConfig,
        mut operation: F,
        name: &str,
    ) -> Result<T, ExecuteError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: FailureDetails + fmt::Display,
    {
        let inner = &self.inner;
        let breaker = &config.circuit_breaker;

        if breaker.enabled && !inner.circuit_breakers.try_acquire(name, breaker) {
            inner.listeners.emit(&ExecutorEvent::Rejected {
                operation: name.to_owned(),
                timestamp: Instant::now(),
            });

            #[cfg(feature = "metrics")]
            counter!("executor_calls_total", "operation" => name.to_owned(), "result" => "rejected")
                .increment(1);

            #[cfg(feature = "tracing")]
            debug!(operation = name, "Call rejected: circuit open");

            return Err(ExecuteError::CircuitOpen {
                operation: name.to_owned(),
            });
        }

        let policy = config.retry_policy();
        let mut attempt: u32 = 0;

        loop {
            #[cfg(feature = "metrics")]
            counter!("executor_attempts_total", "operation" => name.to_owned()).increment(1);

            let error = match tokio::time::timeout(config.timeout, operation()).await {
                Ok(Ok(value)) => {
                    inner.metrics.record_success(name);
                    if breaker.enabled {
                        inner.circuit_breakers.record_success(name);
                    }

                    inner.listeners.emit(&ExecutorEvent::Success {
                        operation: name.to_owned(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                    });

                    #[cfg(feature = "metrics")]
                    {
                        counter!("executor_calls_total", "operation" => name.to_owned(), "result" => "success")
                            .increment(1);
                        histogram!("executor_attempts", "operation" => name.to_owned())
                            .record(f64::from(attempt + 1));
                    }

                    #[cfg(feature = "tracing")]
                    debug!(operation = name, attempt, "Call succeeded");

                    return Ok(value);
                }
                Ok(Err(err)) => ExecuteError::Operation(err),
                Err(_elapsed) => {
                    inner.listeners.emit(&ExecutorEvent::Timeout {
                        operation: name.to_owned(),
                        timestamp: Instant::now(),
                        timeout: config.timeout,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("executor_timeouts_total", "operation" => name.to_owned()).increment(1);

                    #[cfg(feature = "tracing")]
                    warn!(
                        operation = name,
                        attempt,
                        timeout_ms = config.timeout.as_millis() as u64,
                        "Attempt timed out"
                    );

                    ExecuteError::Timeout {
                        operation: name.to_owned(),
                        timeout: config.timeout,
                    }
                }
            };

            inner.metrics.record_failure(name, error.to_string());
            if breaker.enabled {
                inner.circuit_breakers.record_failure(name, breaker);
            }

            #[cfg(feature = "tracing")]
            warn!(operation = name, attempt, kind = %error.kind(), error = %error, "Attempt failed");

            if !policy.should_retry(&error, attempt) {
                let event = if policy.is_retryable(&error) {
                    ExecutorEvent::Error {
                        operation: name.to_owned(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                    }
                } else {
                    ExecutorEvent::IgnoredError {
                        operation: name.to_owned(),
                        timestamp: Instant::now(),
                    }
                };
                inner.listeners.emit(&event);

                #[cfg(feature = "metrics")]
                {
                    counter!("executor_calls_total", "operation" => name.to_owned(), "result" => "failure")
                        .increment(1);
                    histogram!("executor_attempts", "operation" => name.to_owned())
                        .record(f64::from(attempt + 1));
                }

                return Err(error);
            }

            let delay = policy.next_backoff(attempt);
            attempt += 1;

            inner.listeners.emit(&ExecutorEvent::Retry {
                operation: name.to_owned(),
                timestamp: Instant::now(),
                attempt,
                delay,
            });

            #[cfg(feature = "metrics")]
            counter!("executor_retries_total", "operation" => name.to_owned()).increment(1);

            #[cfg(feature = "tracing")]
            debug!(
                operation = name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Retrying after backoff"
            );

            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for ResilienceExecutor {
    fn default() -> Self {
        Self::new(ResilienceConfig::default())
    }
}

impl fmt::Debug for ResilienceExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilienceExecutor")
            .field("config", &self.inner.config)
            .field("circuit_breakers", &self.inner.circuit_breakers)
            .field("metrics", &self.inner.metrics)
            .finish()
    }
}

/// Builder for [`ResilienceExecutor`].
pub struct ResilienceExecutorBuilder {
    config: ResilienceConfig,
    circuit_breakers: Option<Arc<CircuitBreakerRegistry>>,
    metrics: Option<Arc<MetricsRegistry>>,
    listeners: EventListeners<ExecutorEvent>,
}

impl ResilienceExecutorBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ResilienceConfig::default(),
            circuit_breakers: None,
            metrics: None,
            listeners: EventListeners::new(),
        }
    }

    /// Sets the base configuration.
    ///
    /// Default: [`ResilienceConfig::default()`]
    pub fn config(mut self, config: impl Into<ResilienceConfig>) -> Self {
        self.config = config.into();
        self
    }

    /// Shares an existing circuit breaker registry.
    ///
    /// Default: a fresh registry owned by this executor and its clones
    pub fn circuit_breakers(mut self, registry: Arc<CircuitBreakerRegistry>) -> Self {
        self.circuit_breakers = Some(registry);
        self
    }

    /// Shares an existing metrics registry.
    ///
    /// Default: a fresh registry owned by this executor and its clones
    pub fn metrics(mut self, registry: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Registers a callback invoked before each retry with the retry number
    /// (starting at 1) and the backoff delay.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u32, Duration) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let ExecutorEvent::Retry {
                operation,
                attempt,
                delay,
                ..
            } = event
            {
                f(operation, *attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback invoked when a call succeeds, with the number of
    /// attempts it took.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u32) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let ExecutorEvent::Success {
                operation,
                attempts,
                ..
            } = event
            {
                f(operation, *attempts);
            }
        }));
        self
    }

    /// Registers a callback invoked when a call fails after exhausting its
    /// retries.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u32) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let ExecutorEvent::Error {
                operation,
                attempts,
                ..
            } = event
            {
                f(operation, *attempts);
            }
        }));
        self
    }

    /// Registers a callback invoked when a failure is returned without retry
    /// because it is not transient.
    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let ExecutorEvent::IgnoredError { operation, .. } = event {
                f(operation);
            }
        }));
        self
    }

    /// Registers a callback invoked whenever an attempt times out.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Duration) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let ExecutorEvent::Timeout {
                operation, timeout, ..
            } = event
            {
                f(operation, *timeout);
            }
        }));
        self
    }

    /// Registers a callback invoked when an open circuit rejects a call.
    pub fn on_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let ExecutorEvent::Rejected { operation, .. } = event {
                f(operation);
            }
        }));
        self
    }

    /// Registers a listener for every executor event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&ExecutorEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(f));
        self
    }

    /// Builds the executor.
    pub fn build(self) -> ResilienceExecutor {
        crate::describe_metrics();
        ResilienceExecutor {
            inner: Arc::new(Inner {
                config: self.config,
                circuit_breakers: self.circuit_breakers.unwrap_or_default(),
                metrics: self.metrics.unwrap_or_default(),
                listeners: self.listeners,
            }),
        }
    }
}

impl Default for ResilienceExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
