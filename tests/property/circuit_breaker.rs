//! Property tests for the circuit breaker registry.
//!
//! Invariants tested:
//! - Opens exactly when recorded failures reach the threshold
//! - Rejects every call while open
//! - next_attempt_time is always reset_timeout after the opening failure
//! - Half-open admits a single probe whose outcome decides the next state

use callguard_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
use proptest::prelude::*;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

fn paused_runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

fn config(threshold: u32, reset_ms: u64) -> CircuitBreakerConfig {
    CircuitBreakerConfig::builder()
        .failure_threshold(threshold)
        .reset_timeout(Duration::from_millis(reset_ms))
        .build()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the circuit opens on the threshold-th failure and not before
    #[test]
    fn opens_at_threshold(
        threshold in 1u32..=20,
        outcomes in prop::collection::vec(any::<bool>(), 1..60),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let registry = CircuitBreakerRegistry::new();
            let config = config(threshold, 60_000);
            let mut failures = 0;

            for success in outcomes {
                if !registry.try_acquire("op", &config) {
                    prop_assert!(failures >= threshold);
                    prop_assert_eq!(registry.state("op"), CircuitState::Open);
                    continue;
                }
                if success {
                    registry.record_success("op");
                } else {
                    registry.record_failure("op", &config);
                    failures += 1;
                }

                let expected = if failures >= threshold {
                    CircuitState::Open
                } else {
                    CircuitState::Closed
                };
                prop_assert_eq!(registry.state("op"), expected);
            }
            Ok(())
        })?;
    }

    /// Property: an open circuit rejects until the reset timeout elapses
    #[test]
    fn rejects_until_reset_timeout(
        threshold in 1u32..=10,
        reset_ms in 10u64..=120_000,
        probes in prop::collection::vec(0u64..=120_000, 1..10),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let registry = CircuitBreakerRegistry::new();
            let config = config(threshold, reset_ms);
            for _ in 0..threshold {
                registry.record_failure("op", &config);
            }
            let opened_at = tokio::time::Instant::now();

            let snapshot = registry.snapshot("op").unwrap();
            prop_assert_eq!(snapshot.state, CircuitState::Open);
            prop_assert_eq!(
                snapshot.next_attempt_time,
                Some(opened_at + Duration::from_millis(reset_ms))
            );

            let mut probes = probes;
            probes.sort_unstable();
            for at in probes {
                let now = opened_at + Duration::from_millis(at);
                let current = tokio::time::Instant::now();
                if now > current {
                    tokio::time::advance(now - current).await;
                }
                let elapsed = tokio::time::Instant::now() - opened_at;
                let admitted = registry.try_acquire("op", &config);
                if elapsed < Duration::from_millis(reset_ms) {
                    prop_assert!(!admitted, "admitted {:?} into a {}ms open period", elapsed, reset_ms);
                } else {
                    // The first call past the deadline is the probe; it never
                    // reports back here, so the rest are refused.
                    prop_assert_eq!(registry.state("op"), CircuitState::HalfOpen);
                    break;
                }
            }
            Ok(())
        })?;
    }

    /// Property: the probe's outcome decides the next state
    #[test]
    fn probe_outcome_decides_state(
        threshold in 1u32..=10,
        reset_ms in 10u64..=60_000,
        probe_succeeds in any::<bool>(),
        waiting_callers in 0usize..=10,
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let registry = CircuitBreakerRegistry::new();
            let config = config(threshold, reset_ms);
            for _ in 0..threshold {
                registry.record_failure("op", &config);
            }
            tokio::time::advance(Duration::from_millis(reset_ms)).await;

            prop_assert!(registry.try_acquire("op", &config));
            for _ in 0..waiting_callers {
                prop_assert!(!registry.try_acquire("op", &config));
            }

            if probe_succeeds {
                registry.record_success("op");
                let snapshot = registry.snapshot("op").unwrap();
                prop_assert_eq!(snapshot.state, CircuitState::Closed);
                prop_assert_eq!(snapshot.failure_count, 0);
                prop_assert!(registry.try_acquire("op", &config));
            } else {
                registry.record_failure("op", &config);
                let snapshot = registry.snapshot("op").unwrap();
                prop_assert_eq!(snapshot.state, CircuitState::Open);
                prop_assert_eq!(
                    snapshot.next_attempt_time,
                    Some(tokio::time::Instant::now() + Duration::from_millis(reset_ms))
                );
                prop_assert!(!registry.try_acquire("op", &config));
            }
            Ok(())
        })?;
    }
}
