//! Propagation counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for index propagation. Updated by background jobs.
#[derive(Debug, Default)]
pub struct PropagationMetrics {
    pub spawned: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub panicked: AtomicU64,
    pub skipped_not_discoverable: AtomicU64,
    pub skipped_disabled: AtomicU64,
}

impl PropagationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counts as a snapshot.
    pub fn snapshot(&self) -> PropagationMetricsSnapshot {
        PropagationMetricsSnapshot {
            spawned: self.spawned.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            skipped_not_discoverable: self.skipped_not_discoverable.load(Ordering::Relaxed),
            skipped_disabled: self.skipped_disabled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of propagation metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationMetricsSnapshot {
    pub spawned: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub panicked: u64,
    pub skipped_not_discoverable: u64,
    pub skipped_disabled: u64,
}

impl PropagationMetricsSnapshot {
    /// Jobs that ran to an outcome (success, error or panic).
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed + self.panicked
    }

    /// Jobs spawned but not yet finished.
    pub fn in_flight(&self) -> u64 {
        self.spawned.saturating_sub(self.completed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_totals() {
        let metrics = PropagationMetrics::new();
        for _ in 0..4 {
            PropagationMetrics::incr(&metrics.spawned);
        }
        PropagationMetrics::incr(&metrics.succeeded);
        PropagationMetrics::incr(&metrics.failed);
        PropagationMetrics::incr(&metrics.panicked);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.completed(), 3);
        assert_eq!(snapshot.in_flight(), 1);
        assert_eq!(snapshot.skipped_disabled, 0);
    }
}
