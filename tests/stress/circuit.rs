//! Circuit breaker stress tests

use callguard_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Test: rapid open/half-open/closed cycling stays consistent
#[tokio::test]
#[ignore]
async fn stress_rapid_state_transitions() {
    let transitions = Arc::new(AtomicUsize::new(0));
    let t = Arc::clone(&transitions);
    let registry = CircuitBreakerRegistry::builder()
        .on_state_transition(move |_, _, _| {
            t.fetch_add(1, Ordering::Relaxed);
        })
        .build();
    let config = CircuitBreakerConfig::builder()
        .failure_threshold(3)
        .reset_timeout(Duration::from_millis(1))
        .build();

    let start = Instant::now();
    for i in 0..10_000 {
        if !registry.try_acquire("thrash", &config) {
            tokio::time::sleep(Duration::from_millis(1)).await;
            continue;
        }
        if i % 8 < 4 {
            registry.record_failure("thrash", &config);
        } else {
            registry.record_success("thrash");
        }
    }

    println!("10k admissions in {:?}", start.elapsed());
    println!("Transitions: {}", transitions.load(Ordering::Relaxed));

    assert!(transitions.load(Ordering::Relaxed) > 0);
    let snapshot = registry.snapshot("thrash").unwrap();
    if snapshot.state == CircuitState::Closed {
        assert!(snapshot.failure_count < 3);
    }
}

/// Test: only one probe is admitted per half-open period across threads
#[test]
#[ignore]
fn stress_single_probe_across_threads() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let registry = Arc::new(CircuitBreakerRegistry::new());
    let config = CircuitBreakerConfig::builder()
        .failure_threshold(1)
        .reset_timeout(Duration::from_millis(5))
        .build();

    for round in 0..200 {
        runtime.block_on(async {
            registry.record_failure("probe", &config);
            tokio::time::sleep(Duration::from_millis(6)).await;
        });

        let admitted = Arc::new(AtomicUsize::new(0));
        std::thread::scope(|scope| {
            for _ in 0..16 {
                let registry = Arc::clone(&registry);
                let admitted = Arc::clone(&admitted);
                let config = config.clone();
                scope.spawn(move || {
                    if registry.try_acquire("probe", &config) {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 1, "round {round}");
        registry.record_success("probe");
        assert_eq!(registry.state("probe"), CircuitState::Closed);
    }
}
