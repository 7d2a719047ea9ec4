use crate::circuit::{Circuit, CircuitSnapshot, CircuitState};
use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
use callguard_core::{EventListeners, FnListener};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type SharedCircuit = Arc<Mutex<Circuit>>;

/// Circuit records keyed by operation name.
///
/// Records are created lazily on first use and live as long as the registry.
/// Each record has its own lock, so unrelated operations never contend beyond
/// the brief map lookup.
///
/// The policy (threshold, reset timeout, window) is passed with each call
/// rather than stored, so two callers sharing a name but using different
/// policies both see their own policy applied to the shared state.
pub struct CircuitBreakerRegistry {
    circuits: Mutex<HashMap<String, SharedCircuit>>,
    listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerRegistry {
    /// Creates an empty registry with no listeners.
    pub fn new() -> Self {
        crate::describe_metrics();
        Self {
            circuits: Mutex::new(HashMap::new()),
            listeners: EventListeners::new(),
        }
    }

    /// Returns a builder for attaching event listeners.
    pub fn builder() -> CircuitBreakerRegistryBuilder {
        CircuitBreakerRegistryBuilder::new()
    }

    fn circuit(&self, operation: &str) -> SharedCircuit {
        let mut circuits = self.circuits.lock();
        if let Some(circuit) = circuits.get(operation) {
            return Arc::clone(circuit);
        }
        let circuit = Arc::new(Mutex::new(Circuit::new(operation)));
        circuits.insert(operation.to_owned(), Arc::clone(&circuit));
        circuit
    }

    fn existing(&self, operation: &str) -> Option<SharedCircuit> {
        self.circuits.lock().get(operation).cloned()
    }

    // Listeners run once the circuit's lock is released.
    fn update<R>(
        &self,
        circuit: &SharedCircuit,
        f: impl FnOnce(&mut Circuit, &mut Vec<CircuitBreakerEvent>) -> R,
    ) -> R {
        let mut events = Vec::new();
        let result = f(&mut *circuit.lock(), &mut events);
        for event in &events {
            self.listeners.emit(event);
        }
        result
    }

    /// Asks whether a call to `operation` may proceed.
    ///
    /// Closed circuits admit everything. An open circuit whose reset timeout
    /// has elapsed moves to half-open and admits exactly one probe.
    pub fn try_acquire(&self, operation: &str, config: &CircuitBreakerConfig) -> bool {
        let permitted = self.update(&self.circuit(operation), |circuit, events| {
            circuit.try_acquire(config, events)
        });

        #[cfg(feature = "tracing")]
        tracing::trace!(operation, permitted, "Circuit admission");

        permitted
    }

    /// Records a successful call. Closes a half-open circuit.
    pub fn record_success(&self, operation: &str) {
        self.update(&self.circuit(operation), |circuit, events| {
            circuit.record_success(events)
        });
    }

    /// Records a failed call, opening the circuit when the threshold is met
    /// or when the failing call was the half-open probe.
    pub fn record_failure(&self, operation: &str, config: &CircuitBreakerConfig) {
        self.update(&self.circuit(operation), |circuit, events| {
            circuit.record_failure(config, events)
        });
    }

    /// Current state of `operation`'s circuit.
    ///
    /// Unknown operations report [`CircuitState::Closed`] and get a record.
    pub fn state(&self, operation: &str) -> CircuitState {
        self.update(&self.circuit(operation), |circuit, events| {
            circuit.resolve_state(events)
        })
    }

    /// Snapshot of `operation`'s circuit, or `None` if it was never used.
    pub fn snapshot(&self, operation: &str) -> Option<CircuitSnapshot> {
        let circuit = self.existing(operation)?;
        Some(self.update(&circuit, |circuit, events| {
            circuit.resolve_state(events);
            circuit.snapshot()
        }))
    }

    /// Snapshots of every known circuit, keyed by operation name.
    pub fn snapshots(&self) -> std::collections::HashMap<String, CircuitSnapshot> {
        let circuits: Vec<(String, SharedCircuit)> = self
            .circuits
            .lock()
            .iter()
            .map(|(name, circuit)| (name.clone(), Arc::clone(circuit)))
            .collect();

        circuits
            .into_iter()
            .map(|(name, circuit)| {
                let snapshot = self.update(&circuit, |circuit, events| {
                    circuit.resolve_state(events);
                    circuit.snapshot()
                });
                (name, snapshot)
            })
            .collect()
    }

    /// Forces `operation`'s circuit closed and clears its failure history.
    ///
    /// Does nothing for operations that were never used.
    pub fn reset(&self, operation: &str) {
        if let Some(circuit) = self.existing(operation) {
            self.update(&circuit, |circuit, events| circuit.reset(events));
        }
    }

    /// Forces `operation`'s circuit open for one reset timeout.
    pub fn force_open(&self, operation: &str, config: &CircuitBreakerConfig) {
        self.update(&self.circuit(operation), |circuit, events| {
            circuit.force_open(config, events)
        });
    }

    /// Number of known circuits.
    pub fn len(&self) -> usize {
        self.circuits.lock().len()
    }

    /// Returns true if no circuit has been created yet.
    pub fn is_empty(&self) -> bool {
        self.circuits.lock().is_empty()
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("circuits", &self.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Builder for [`CircuitBreakerRegistry`].
#[derive(Default)]
pub struct CircuitBreakerRegistryBuilder {
    listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerRegistryBuilder {
    /// Creates a builder with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for state transitions.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::StateTransition {
                operation,
                from_state,
                to_state,
                ..
            } = event
            {
                f(operation, *from_state, *to_state);
            }
        }));
        self
    }

    /// Registers a callback for calls rejected by an open circuit.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallRejected { operation, .. } = event {
                f(operation);
            }
        }));
        self
    }

    /// Registers a callback for recorded failures, with the running count.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u32) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::FailureRecorded {
                operation,
                failure_count,
                ..
            } = event
            {
                f(operation, *failure_count);
            }
        }));
        self
    }

    /// Registers a callback for recorded successes.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::SuccessRecorded { operation, .. } = event {
                f(operation);
            }
        }));
        self
    }

    /// Registers a listener for every circuit breaker event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&CircuitBreakerEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(f));
        self
    }

    /// Builds the registry.
    pub fn build(self) -> CircuitBreakerRegistry {
        crate::describe_metrics();
        CircuitBreakerRegistry {
            circuits: Mutex::new(HashMap::new()),
            listeners: self.listeners,
        }
    }
}
