use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Represents the state of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Calls are allowed.
    Closed,
    /// Calls are rejected until the reset timeout elapses.
    Open,
    /// One probe call is allowed to test recovery.
    HalfOpen,
}

impl CircuitState {
    /// Upper-case label (`CLOSED`, `OPEN`, `HALF_OPEN`).
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of a circuit record.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitSnapshot {
    /// Current state (after any lazy Open to HalfOpen transition).
    pub state: CircuitState,
    /// Failures counted toward the threshold.
    pub failure_count: u32,
    /// When the most recent failure was recorded.
    pub last_failure_time: Option<Instant>,
    /// When an open circuit will admit a probe. Only set while open.
    pub next_attempt_time: Option<Instant>,
    /// Time since the last state transition.
    pub time_since_state_change: Duration,
}

pub(crate) struct Circuit {
    operation: String,
    state: CircuitState,
    failure_count: u32,
    // Only populated when a monitoring period is configured.
    failure_times: VecDeque<Instant>,
    last_failure_time: Option<Instant>,
    next_attempt_time: Option<Instant>,
    probe_started: Option<Instant>,
    last_state_change: Instant,
}

impl Circuit {
    pub(crate) fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            state: CircuitState::Closed,
            failure_count: 0,
            failure_times: VecDeque::new(),
            last_failure_time: None,
            next_attempt_time: None,
            probe_started: None,
            last_state_change: Instant::now(),
        }
    }

    /// Returns the state, moving an expired open circuit to half-open first.
    pub(crate) fn resolve_state(
        &mut self,
        events: &mut Vec<CircuitBreakerEvent>,
    ) -> CircuitState {
        if self.state == CircuitState::Open {
            let now = Instant::now();
            if self.next_attempt_time.map_or(true, |at| now >= at) {
                self.transition(CircuitState::HalfOpen, now, events);
            }
        }
        self.state
    }

    pub(crate) fn try_acquire(
        &mut self,
        config: &CircuitBreakerConfig,
        events: &mut Vec<CircuitBreakerEvent>,
    ) -> bool {
        let permitted = match self.resolve_state(events) {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                // One probe at a time; a claim older than the reset timeout
                // belongs to a caller that went away without reporting.
                let now = Instant::now();
                let free = self
                    .probe_started
                    .map_or(true, |started| now.duration_since(started) >= config.reset_timeout);
                if free {
                    self.probe_started = Some(now);
                }
                free
            }
        };

        if permitted {
            events.push(CircuitBreakerEvent::CallPermitted {
                operation: self.operation.clone(),
                timestamp: std::time::Instant::now(),
                state: self.state,
            });
        } else {
            events.push(CircuitBreakerEvent::CallRejected {
                operation: self.operation.clone(),
                timestamp: std::time::Instant::now(),
            });

            #[cfg(feature = "metrics")]
            counter!("circuitbreaker_calls_total", "circuitbreaker" => self.operation.clone(), "outcome" => "rejected").increment(1);
        }

        permitted
    }

    pub(crate) fn record_success(&mut self, events: &mut Vec<CircuitBreakerEvent>) {
        events.push(CircuitBreakerEvent::SuccessRecorded {
            operation: self.operation.clone(),
            timestamp: std::time::Instant::now(),
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => self.operation.clone(), "outcome" => "success").increment(1);

        if self.state == CircuitState::HalfOpen {
            self.transition(CircuitState::Closed, Instant::now(), events);
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        config: &CircuitBreakerConfig,
        events: &mut Vec<CircuitBreakerEvent>,
    ) {
        let now = Instant::now();
        self.count_failure(now, config);

        events.push(CircuitBreakerEvent::FailureRecorded {
            operation: self.operation.clone(),
            timestamp: std::time::Instant::now(),
            state: self.state,
            failure_count: self.failure_count,
        });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => self.operation.clone(), "outcome" => "failure").increment(1);

        match self.state {
            CircuitState::HalfOpen => self.open(now, config, events),
            CircuitState::Closed if self.failure_count >= config.effective_threshold() => {
                self.open(now, config, events)
            }
            // Late failures from calls admitted before the circuit opened
            // push the probe further out.
            CircuitState::Open => self.next_attempt_time = Some(now + config.reset_timeout),
            CircuitState::Closed => {}
        }
    }

    pub(crate) fn force_open(
        &mut self,
        config: &CircuitBreakerConfig,
        events: &mut Vec<CircuitBreakerEvent>,
    ) {
        self.open(Instant::now(), config, events);
    }

    pub(crate) fn reset(&mut self, events: &mut Vec<CircuitBreakerEvent>) {
        self.transition(CircuitState::Closed, Instant::now(), events);
        self.clear_failures();
    }

    pub(crate) fn snapshot(&self) -> CircuitSnapshot {
        CircuitSnapshot {
            state: self.state,
            failure_count: self.failure_count,
            last_failure_time: self.last_failure_time,
            next_attempt_time: self.next_attempt_time,
            time_since_state_change: self.last_state_change.elapsed(),
        }
    }

    fn count_failure(&mut self, now: Instant, config: &CircuitBreakerConfig) {
        self.last_failure_time = Some(now);

        match config.monitoring_period {
            Some(period) => {
                self.failure_times.push_back(now);
                while let Some(&oldest) = self.failure_times.front() {
                    if now.duration_since(oldest) > period {
                        self.failure_times.pop_front();
                    } else {
                        break;
                    }
                }
                // Only the newest `threshold` failures can matter.
                let cap = config.effective_threshold() as usize;
                while self.failure_times.len() > cap {
                    self.failure_times.pop_front();
                }
                self.failure_count = self.failure_times.len() as u32;
            }
            None => self.failure_count = self.failure_count.saturating_add(1),
        }
    }

    fn clear_failures(&mut self) {
        self.failure_count = 0;
        self.failure_times.clear();
    }

    fn open(
        &mut self,
        now: Instant,
        config: &CircuitBreakerConfig,
        events: &mut Vec<CircuitBreakerEvent>,
    ) {
        self.next_attempt_time = Some(now + config.reset_timeout);
        self.transition(CircuitState::Open, now, events);
    }

    fn transition(
        &mut self,
        to: CircuitState,
        now: Instant,
        events: &mut Vec<CircuitBreakerEvent>,
    ) {
        let from = self.state;
        if from == to {
            return;
        }

        self.state = to;
        self.last_state_change = now;
        self.probe_started = None;
        match to {
            CircuitState::Closed => {
                self.next_attempt_time = None;
                self.clear_failures();
            }
            CircuitState::HalfOpen => self.next_attempt_time = None,
            CircuitState::Open => {}
        }

        events.push(CircuitBreakerEvent::StateTransition {
            operation: self.operation.clone(),
            timestamp: std::time::Instant::now(),
            from_state: from,
            to_state: to,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(operation = %self.operation, from = %from, to = %to, "Circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => self.operation.clone(),
                "from" => from.as_str(),
                "to" => to.as_str()
            )
            .increment(1);

            gauge!("circuitbreaker_state", "circuitbreaker" => self.operation.clone(), "state" => from.as_str())
                .set(0.0);
            gauge!("circuitbreaker_state", "circuitbreaker" => self.operation.clone(), "state" => to.as_str())
                .set(1.0);
        }
    }
}
