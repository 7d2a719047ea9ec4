use super::{Calls, TestError};
use callguard_executor::{
    MetricsRegistry, OperationMetrics, ResilienceConfig, ResilienceExecutor, ResilienceOverrides,
};
use std::sync::Arc;
use std::time::Duration;

fn config() -> ResilienceConfig {
    ResilienceConfig::builder()
        .max_retries(3)
        .fixed_backoff(Duration::from_millis(5))
        .jitter(false)
        .without_circuit_breaker()
        .build()
}

#[test]
fn unknown_operation_reads_as_zeroed() {
    let executor = ResilienceExecutor::new(config());

    let metrics = executor.metrics().get("never-called");

    assert_eq!(metrics, OperationMetrics::default());
    assert_eq!(metrics.success_rate(), None);
    assert!(executor.metrics().is_empty());
}

#[tokio::test(start_paused = true)]
async fn every_attempt_is_recorded() {
    let executor = ResilienceExecutor::new(config());
    let calls = Calls::default();

    executor
        .execute(
            || {
                let n = calls.next();
                async move {
                    match n {
                        0 => Err(TestError::Status(500)),
                        1 => Err(TestError::Status(502)),
                        _ => Ok(()),
                    }
                }
            },
            &ResilienceOverrides::new(),
            "op",
        )
        .await
        .unwrap();

    let metrics = executor.metrics().get("op");
    assert_eq!(metrics.successes, 1);
    assert_eq!(metrics.failures, 2);
    assert_eq!(metrics.total(), 3);
    assert_eq!(metrics.last_error.as_deref(), Some("HTTP 502"));
    assert!(metrics.last_success.is_some());
    assert!(metrics.last_failure.is_some());
    assert!(metrics.last_failure <= metrics.last_success);
}

#[tokio::test(start_paused = true)]
async fn success_does_not_clear_last_error() {
    let executor = ResilienceExecutor::new(config());

    let _: Result<(), _> = executor
        .execute(
            || async { Err(TestError::Fatal) },
            &ResilienceOverrides::new(),
            "op",
        )
        .await;
    executor
        .execute(
            || async { Ok::<_, TestError>(()) },
            &ResilienceOverrides::new(),
            "op",
        )
        .await
        .unwrap();

    let metrics = executor.metrics().get("op");
    assert_eq!(metrics.last_error.as_deref(), Some("fatal error"));
    assert_eq!(metrics.success_rate(), Some(0.5));
}

#[tokio::test(start_paused = true)]
async fn operations_are_tracked_separately() {
    let executor = ResilienceExecutor::new(config());

    for name in ["GET /a", "GET /a", "GET /b"] {
        executor
            .execute(
                || async { Ok::<_, TestError>(()) },
                &ResilienceOverrides::new(),
                name,
            )
            .await
            .unwrap();
    }

    let all = executor.metrics().all();
    assert_eq!(all.len(), 2);
    assert_eq!(all["GET /a"].successes, 2);
    assert_eq!(all["GET /b"].successes, 1);
}

#[tokio::test(start_paused = true)]
async fn injected_registry_is_shared() {
    let registry = Arc::new(MetricsRegistry::new());
    let a = ResilienceExecutor::builder()
        .config(config())
        .metrics(Arc::clone(&registry))
        .build();
    let b = ResilienceExecutor::builder()
        .config(config())
        .metrics(Arc::clone(&registry))
        .build();

    for executor in [&a, &b] {
        executor
            .execute(
                || async { Ok::<_, TestError>(()) },
                &ResilienceOverrides::new(),
                "shared",
            )
            .await
            .unwrap();
    }

    assert_eq!(registry.get("shared").successes, 2);
    assert!(Arc::ptr_eq(a.metrics(), b.metrics()));
}

#[tokio::test(start_paused = true)]
async fn rejected_calls_are_not_counted() {
    let executor = ResilienceExecutor::new(config());
    let overrides = ResilienceOverrides::new()
        .max_retries(0)
        .circuit_breaker_enabled(true)
        .failure_threshold(1);

    for _ in 0..3 {
        let _: Result<(), _> = executor
            .execute(|| async { Err(TestError::Status(500)) }, &overrides, "op")
            .await;
    }

    let metrics = executor.metrics().get("op");
    assert_eq!(metrics.failures, 1);
    assert_eq!(metrics.successes, 0);
}
