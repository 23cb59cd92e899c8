//! Metrics hooks for accumulator operations
//!
//! ## Usage
//!
//! ```ignore
//! use qc_04_state_accumulator::metrics::{AccumulatorMetrics, MetricsRecorder};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(AccumulatorMetrics::new());
//! let shared = SharedAccumulator::new(config)?.with_metrics(metrics.clone());
//!
//! shared.apply_batch(&batch)?;
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Thread-safe counters for the accumulator.
#[derive(Default)]
pub struct AccumulatorMetrics {
    /// Records added
    pub records_added: AtomicU64,
    /// Records removed
    pub records_removed: AtomicU64,
    /// Batches applied (including reverts)
    pub batches_applied: AtomicU64,
    /// Checksums encoded
    pub checksums_computed: AtomicU64,
    /// Snapshots accepted
    pub snapshots_verified: AtomicU64,
    /// Snapshots rejected
    pub snapshots_rejected: AtomicU64,
    /// Cumulative batch time in nanoseconds
    pub batch_time_ns: AtomicU64,
}

impl AccumulatorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mutation(&self, added: u64, removed: u64) {
        self.records_added.fetch_add(added, Ordering::Relaxed);
        self.records_removed.fetch_add(removed, Ordering::Relaxed);
    }

    pub fn record_batch(&self, added: u64, removed: u64, duration: Duration) {
        self.record_mutation(added, removed);
        self.batches_applied.fetch_add(1, Ordering::Relaxed);
        self.batch_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_checksum(&self) {
        self.checksums_computed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verification(&self, accepted: bool) {
        if accepted {
            self.snapshots_verified.fetch_add(1, Ordering::Relaxed);
        } else {
            self.snapshots_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn avg_batch_time_ns(&self) -> u64 {
        let total = self.batch_time_ns.load(Ordering::Relaxed);
        let count = self.batches_applied.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_added: self.records_added.load(Ordering::Relaxed),
            records_removed: self.records_removed.load(Ordering::Relaxed),
            batches_applied: self.batches_applied.load(Ordering::Relaxed),
            checksums_computed: self.checksums_computed.load(Ordering::Relaxed),
            snapshots_verified: self.snapshots_verified.load(Ordering::Relaxed),
            snapshots_rejected: self.snapshots_rejected.load(Ordering::Relaxed),
            avg_batch_ns: self.avg_batch_time_ns(),
        }
    }

    pub fn reset(&self) {
        self.records_added.store(0, Ordering::Relaxed);
        self.records_removed.store(0, Ordering::Relaxed);
        self.batches_applied.store(0, Ordering::Relaxed);
        self.checksums_computed.store(0, Ordering::Relaxed);
        self.snapshots_verified.store(0, Ordering::Relaxed);
        self.snapshots_rejected.store(0, Ordering::Relaxed);
        self.batch_time_ns.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_added: u64,
    pub records_removed: u64,
    pub batches_applied: u64,
    pub checksums_computed: u64,
    pub snapshots_verified: u64,
    pub snapshots_rejected: u64,
    pub avg_batch_ns: u64,
}

/// Hook for external metrics systems.
pub trait MetricsRecorder: Send + Sync {
    fn record_mutation(&self, added: u64, removed: u64);

    fn record_batch(&self, added: u64, removed: u64, duration: Duration);

    fn record_checksum(&self);

    fn record_verification(&self, accepted: bool);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_mutation(&self, _: u64, _: u64) {}
    fn record_batch(&self, _: u64, _: u64, _: Duration) {}
    fn record_checksum(&self) {}
    fn record_verification(&self, _: bool) {}
}

impl MetricsRecorder for AccumulatorMetrics {
    fn record_mutation(&self, added: u64, removed: u64) {
        AccumulatorMetrics::record_mutation(self, added, removed);
    }

    fn record_batch(&self, added: u64, removed: u64, duration: Duration) {
        AccumulatorMetrics::record_batch(self, added, removed, duration);
    }

    fn record_checksum(&self) {
        AccumulatorMetrics::record_checksum(self);
    }

    fn record_verification(&self, accepted: bool) {
        AccumulatorMetrics::record_verification(self, accepted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let snapshot = AccumulatorMetrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[test]
    fn test_record_batches() {
        let metrics = AccumulatorMetrics::new();

        metrics.record_batch(3, 1, Duration::from_nanos(100));
        metrics.record_batch(2, 0, Duration::from_nanos(200));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_added, 5);
        assert_eq!(snapshot.records_removed, 1);
        assert_eq!(snapshot.batches_applied, 2);
        assert_eq!(snapshot.avg_batch_ns, 150);
    }

    #[test]
    fn test_record_verification() {
        let metrics = AccumulatorMetrics::new();
        metrics.record_verification(true);
        metrics.record_verification(false);
        metrics.record_verification(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.snapshots_verified, 1);
        assert_eq!(snapshot.snapshots_rejected, 2);
    }

    #[test]
    fn test_reset() {
        let metrics = AccumulatorMetrics::new();
        metrics.record_mutation(1, 1);
        metrics.record_checksum();
        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_noop_recorder() {
        let recorder: &dyn MetricsRecorder = &NoOpMetrics;
        recorder.record_batch(1, 1, Duration::from_nanos(1));
        recorder.record_verification(true);
    }
}
