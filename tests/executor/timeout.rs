use super::{Calls, TestError};
use callguard_core::{FailureDetails, FailureKind, TransportCode};
use callguard_executor::{ResilienceConfig, ResilienceExecutor, ResilienceOverrides};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn config() -> ResilienceConfig {
    ResilienceConfig::builder()
        .max_retries(2)
        .fixed_backoff(Duration::from_millis(10))
        .jitter(false)
        .timeout(Duration::from_millis(100))
        .without_circuit_breaker()
        .build()
}

/// Sets the flag when dropped before completing.
struct DropGuard(Arc<AtomicBool>);

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn slow_attempt_times_out_without_retry() {
    let executor = ResilienceExecutor::new(config());
    let calls = Calls::default();
    let start = Instant::now();

    let err = executor
        .execute(
            || {
                calls.next();
                async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<_, TestError>(())
                }
            },
            &ResilienceOverrides::new(),
            "slow",
        )
        .await
        .unwrap_err();

    assert_eq!(calls.count(), 1);
    assert!(err.is_timeout());
    assert_eq!(err.kind(), FailureKind::Timeout);
    assert_eq!(err.transport_code(), None);
    assert_eq!(start.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn operation_reported_timeouts_are_retried() {
    let executor = ResilienceExecutor::new(config());
    let calls = Calls::default();

    let value = executor
        .execute(
            || {
                let n = calls.next();
                async move {
                    if n == 0 {
                        Err(TestError::Transport(TransportCode::TimedOut))
                    } else {
                        Ok(n)
                    }
                }
            },
            &ResilienceOverrides::new(),
            "upstream",
        )
        .await
        .unwrap();

    assert_eq!(value, 1);
    assert_eq!(calls.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn timed_out_attempt_is_cancelled() {
    let executor = ResilienceExecutor::new(config());
    let dropped = Arc::new(AtomicBool::new(false));
    let completed = Arc::new(AtomicBool::new(false));

    let result = executor
        .execute(
            || {
                let guard = DropGuard(Arc::clone(&dropped));
                let completed = Arc::clone(&completed);
                async move {
                    let _guard = guard;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    completed.store(true, Ordering::SeqCst);
                    Ok::<_, TestError>(())
                }
            },
            &ResilienceOverrides::new().max_retries(0),
            "slow",
        )
        .await;

    assert!(result.unwrap_err().is_timeout());
    assert!(dropped.load(Ordering::SeqCst));
    assert!(!completed.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn fast_attempts_are_unaffected() {
    let executor = ResilienceExecutor::new(config());

    let value = executor
        .execute(
            || async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, TestError>("fast")
            },
            &ResilienceOverrides::new(),
            "fast",
        )
        .await
        .unwrap();

    assert_eq!(value, "fast");
}

#[tokio::test(start_paused = true)]
async fn timeout_listener_and_metrics() {
    let timeouts = Arc::new(AtomicU32::new(0));
    let retries = Arc::new(AtomicU32::new(0));
    let t = Arc::clone(&timeouts);
    let r = Arc::clone(&retries);

    let executor = ResilienceExecutor::builder()
        .config(config())
        .on_timeout(move |_, timeout| {
            if timeout == Duration::from_millis(100) {
                t.fetch_add(1, Ordering::SeqCst);
            }
        })
        .on_retry(move |_, _, _| {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let calls = Calls::default();
    let attempt = || {
        let n = calls.next();
        async move {
            if n == 0 {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok::<_, TestError>(n)
        }
    };

    let err = executor
        .execute(attempt, &ResilienceOverrides::new(), "slow")
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let value = executor
        .execute(attempt, &ResilienceOverrides::new(), "slow")
        .await
        .unwrap();
    assert_eq!(value, 1);

    assert_eq!(timeouts.load(Ordering::SeqCst), 1);
    assert_eq!(retries.load(Ordering::SeqCst), 0);

    let metrics = executor.metrics().get("slow");
    assert_eq!(metrics.failures, 1);
    assert_eq!(metrics.successes, 1);
    assert_eq!(
        metrics.last_error.as_deref(),
        Some("`slow` timed out after 100ms")
    );
}

#[tokio::test(start_paused = true)]
async fn per_call_timeout_override() {
    let executor = ResilienceExecutor::new(config());

    let value = executor
        .execute(
            || async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, TestError>(())
            },
            &ResilienceOverrides::new().timeout(Duration::from_secs(1)),
            "patient",
        )
        .await;

    assert!(value.is_ok());
}
