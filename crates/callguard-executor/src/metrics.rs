use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Success and failure counters for one operation name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OperationMetrics {
    /// Successful attempts.
    pub successes: u64,
    /// Failed attempts, including timeouts.
    pub failures: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

impl OperationMetrics {
    /// Attempts recorded so far.
    pub fn total(&self) -> u64 {
        self.successes.saturating_add(self.failures)
    }

    /// Fraction of attempts that succeeded, or `None` before the first one.
    pub fn success_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.successes as f64 / total as f64),
        }
    }
}

/// Per-operation attempt counters, kept for the registry's lifetime.
///
/// Every attempt the executor makes is recorded here, so a call that
/// succeeds on its third attempt contributes two failures and one success.
#[derive(Default)]
pub struct MetricsRegistry {
    records: Mutex<HashMap<String, Arc<Mutex<OperationMetrics>>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, operation: &str) -> Arc<Mutex<OperationMetrics>> {
        let mut records = self.records.lock();
        if let Some(record) = records.get(operation) {
            return Arc::clone(record);
        }
        let record = Arc::new(Mutex::new(OperationMetrics::default()));
        records.insert(operation.to_owned(), Arc::clone(&record));
        record
    }

    /// Records a successful attempt.
    pub fn record_success(&self, operation: &str) {
        let record = self.record(operation);
        let mut record = record.lock();
        record.successes = record.successes.saturating_add(1);
        record.last_success = Some(Utc::now());
    }

    /// Records a failed attempt and remembers its message.
    pub fn record_failure(&self, operation: &str, message: impl Into<String>) {
        let record = self.record(operation);
        let mut record = record.lock();
        record.failures = record.failures.saturating_add(1);
        record.last_failure = Some(Utc::now());
        record.last_error = Some(message.into());
    }

    /// Copy of `operation`'s record; a zeroed record if it was never used.
    pub fn get(&self, operation: &str) -> OperationMetrics {
        let record = self.records.lock().get(operation).cloned();
        record
            .map(|record| record.lock().clone())
            .unwrap_or_default()
    }

    /// Copies of every record, keyed by operation name.
    pub fn all(&self) -> std::collections::HashMap<String, OperationMetrics> {
        let records: Vec<_> = self
            .records
            .lock()
            .iter()
            .map(|(name, record)| (name.clone(), Arc::clone(record)))
            .collect();

        records
            .into_iter()
            .map(|(name, record)| {
                let snapshot = record.lock().clone();
                (name, snapshot)
            })
            .collect()
    }

    /// Number of operation names seen.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("operations", &self.len())
            .finish()
    }
}
