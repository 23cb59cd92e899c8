//! # Shared Accumulator
//!
//! Lock-guarded accumulator for callers that mutate from several threads.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──initialize──→ Identity ──add/remove──→ Active
//!       │                          │                        │
//!       └──────────────────────discard─────────────────────→ Discarded
//! ```
//!
//! Writers hold the write lock for the whole group addition, so readers
//! never observe a half-applied update. Hash-to-group for a batch runs
//! before the lock is taken.
//!
//! A panic while the write lock is held poisons it. The accumulator value
//! is then untrusted and every later call fails with
//! `AccumulatorError::ConcurrencyViolation`.

use crate::domain::{
    map_mutations_parallel, sum, AccumulatorConfig, AccumulatorError, Checksum, ChecksumEnvelope,
    MultisetHash, MutationBatch, StateMutation,
};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::StateChangeSink;
use shared_crypto::{PrimeOrderGroup, Ristretto255};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Lifecycle phase of a shared accumulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Identity,
    Active,
    Discarded,
}

struct Inner {
    phase: Lifecycle,
    hash: MultisetHash<Ristretto255>,
    record_count: u64,
}

impl Inner {
    fn ensure_live(&self) -> Result<(), AccumulatorError> {
        match self.phase {
            Lifecycle::Uninitialized => Err(AccumulatorError::Uninitialized),
            Lifecycle::Discarded => Err(AccumulatorError::Discarded),
            Lifecycle::Identity | Lifecycle::Active => Ok(()),
        }
    }

    fn count_added(&mut self, n: u64) {
        self.record_count = self.record_count.saturating_add(n);
    }

    fn count_removed(&mut self, n: u64) {
        if n > self.record_count {
            warn!(
                "[qc-04] Removing {} records from a state of {}; unbalanced remove",
                n, self.record_count
            );
        }
        self.record_count = self.record_count.saturating_sub(n);
    }
}

/// State around one batch application, read atomically with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchOutcome {
    pub previous: Checksum,
    pub checksum: Checksum,
    pub record_count: u64,
}

/// Thread-safe accumulator with an explicit lifecycle.
pub struct SharedAccumulator {
    inner: RwLock<Inner>,
    config: AccumulatorConfig,
    metrics: Arc<dyn MetricsRecorder>,
}

impl SharedAccumulator {
    /// Create an uninitialized accumulator. Call `initialize` before use.
    pub fn new(config: AccumulatorConfig) -> Result<Self, AccumulatorError> {
        config.validate()?;
        Ok(Self {
            inner: RwLock::new(Inner {
                phase: Lifecycle::Uninitialized,
                hash: MultisetHash::new(config.domain_tag.clone()),
                record_count: 0,
            }),
            config,
            metrics: Arc::new(NoOpMetrics),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// Reset to the identity (empty state). Allowed from any phase except
    /// `Discarded`.
    pub fn initialize(&self) -> Result<(), AccumulatorError> {
        let mut inner = self.write()?;
        if inner.phase == Lifecycle::Discarded {
            return Err(AccumulatorError::Discarded);
        }

        inner.hash.initialize();
        inner.record_count = 0;
        inner.phase = Lifecycle::Identity;

        info!("[qc-04] Accumulator initialized to identity");
        Ok(())
    }

    /// Initialize from a persisted envelope instead of the identity.
    pub fn resume(&self, envelope: &ChecksumEnvelope) -> Result<(), AccumulatorError> {
        if envelope.format_version != self.config.format_version {
            return Err(AccumulatorError::UnsupportedFormatVersion(
                envelope.format_version,
            ));
        }
        let hash: MultisetHash<Ristretto255> =
            MultisetHash::from_checksum(&envelope.checksum, self.config.domain_tag.clone())?;

        let mut inner = self.write()?;
        if inner.phase == Lifecycle::Discarded {
            return Err(AccumulatorError::Discarded);
        }

        inner.phase = if hash.is_identity() {
            Lifecycle::Identity
        } else {
            Lifecycle::Active
        };
        inner.hash = hash;
        inner.record_count = envelope.record_count;

        info!(
            "[qc-04] Accumulator resumed at {} ({} records)",
            envelope.checksum, envelope.record_count
        );
        Ok(())
    }

    /// Terminal transition. Every later call fails with `Discarded`.
    pub fn discard(&self) -> Result<(), AccumulatorError> {
        let mut inner = self.write()?;
        inner.phase = Lifecycle::Discarded;
        info!("[qc-04] Accumulator discarded");
        Ok(())
    }

    pub fn phase(&self) -> Result<Lifecycle, AccumulatorError> {
        Ok(self.read()?.phase)
    }

    pub fn add(&self, record: &[u8]) -> Result<(), AccumulatorError> {
        // Map outside the lock; only the group addition is serialized.
        let point = Self::map(&self.config, record);

        let mut inner = self.write()?;
        inner.ensure_live()?;
        inner.hash.add_element(&point);
        inner.count_added(1);
        inner.phase = Lifecycle::Active;
        drop(inner);

        self.metrics.record_mutation(1, 0);
        Ok(())
    }

    pub fn remove(&self, record: &[u8]) -> Result<(), AccumulatorError> {
        let point = Self::map(&self.config, record);

        let mut inner = self.write()?;
        inner.ensure_live()?;
        inner.hash.remove_element(&point);
        inner.count_removed(1);
        inner.phase = Lifecycle::Active;
        drop(inner);

        self.metrics.record_mutation(0, 1);
        Ok(())
    }

    /// Apply a batch as one group addition. Mapping runs in parallel for
    /// large batches.
    pub fn apply_batch(&self, batch: &MutationBatch) -> Result<Checksum, AccumulatorError> {
        Ok(self.apply_batch_tracked(batch)?.checksum)
    }

    /// Like `apply_batch`, but also reports the checksum the batch was
    /// applied on and the resulting record count. All three are taken under
    /// the same write guard as the addition.
    pub fn apply_batch_tracked(&self, batch: &MutationBatch) -> Result<BatchOutcome, AccumulatorError> {
        let start = Instant::now();

        // Fail before doing the expensive mapping.
        self.read()?.ensure_live()?;

        let points = map_mutations_parallel::<Ristretto255>(
            batch.mutations(),
            &self.config.domain_tag,
            self.config.parallel_threshold,
        );
        let delta = sum::<Ristretto255>(points);

        let added = batch.additions() as u64;
        let removed = batch.removals() as u64;

        let mut inner = self.write()?;
        inner.ensure_live()?;
        let previous = inner.hash.checksum();
        inner.hash.add_element(&delta);
        inner.count_added(added);
        inner.count_removed(removed);
        if !batch.is_empty() {
            inner.phase = Lifecycle::Active;
        }
        let outcome = BatchOutcome {
            previous,
            checksum: inner.hash.checksum(),
            record_count: inner.record_count,
        };
        drop(inner);

        self.metrics.record_batch(added, removed, start.elapsed());
        self.metrics.record_checksum();

        debug!(
            "[qc-04] Applied batch: +{} -{} records in {:?}",
            added,
            removed,
            start.elapsed()
        );
        Ok(outcome)
    }

    /// `revert_batch` counterpart of `apply_batch_tracked`.
    pub fn revert_batch_tracked(&self, batch: &MutationBatch) -> Result<BatchOutcome, AccumulatorError> {
        self.apply_batch_tracked(&batch.inverse())
    }

    /// Undo a previously applied batch by replaying its inverse.
    pub fn revert_batch(&self, batch: &MutationBatch) -> Result<Checksum, AccumulatorError> {
        self.apply_batch(&batch.inverse())
    }

    pub fn apply_mutation(&self, mutation: &StateMutation) -> Result<(), AccumulatorError> {
        match mutation {
            StateMutation::Added(record) => self.add(record),
            StateMutation::Removed(record) => self.remove(record),
        }
    }

    pub fn checksum(&self) -> Result<Checksum, AccumulatorError> {
        let inner = self.read()?;
        inner.ensure_live()?;
        let checksum = inner.hash.checksum();
        drop(inner);

        self.metrics.record_checksum();
        Ok(checksum)
    }

    pub fn record_count(&self) -> Result<u64, AccumulatorError> {
        let inner = self.read()?;
        inner.ensure_live()?;
        Ok(inner.record_count)
    }

    /// Checksum and record count, read under one lock.
    pub fn envelope(&self) -> Result<ChecksumEnvelope, AccumulatorError> {
        let inner = self.read()?;
        inner.ensure_live()?;
        let mut envelope = ChecksumEnvelope::new(inner.hash.checksum(), inner.record_count);
        envelope.format_version = self.config.format_version;
        drop(inner);

        self.metrics.record_checksum();
        Ok(envelope)
    }

    /// Copy of the current accumulator, for merging or offline work.
    pub fn snapshot(&self) -> Result<MultisetHash<Ristretto255>, AccumulatorError> {
        let inner = self.read()?;
        inner.ensure_live()?;
        Ok(inner.hash.clone())
    }

    /// Run `f` against the accumulator under the write lock. Bypasses the
    /// record count, so it only exists for exercising lock poisoning.
    #[cfg(test)]
    fn mutate_with<F, T>(&self, f: F) -> Result<T, AccumulatorError>
    where
        F: FnOnce(&mut MultisetHash<Ristretto255>) -> T,
    {
        let mut inner = self.write()?;
        inner.ensure_live()?;
        let result = f(&mut inner.hash);
        inner.phase = Lifecycle::Active;
        Ok(result)
    }

    fn map(config: &AccumulatorConfig, record: &[u8]) -> <Ristretto255 as PrimeOrderGroup>::Element {
        Ristretto255::map_to_group(record, &config.domain_tag)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, AccumulatorError> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, AccumulatorError> {
        self.inner.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> AccumulatorError {
    error!("[qc-04] Accumulator lock poisoned; state is no longer trusted");
    AccumulatorError::ConcurrencyViolation
}

impl StateChangeSink for SharedAccumulator {
    fn record_added(&self, record: &[u8]) -> Result<(), AccumulatorError> {
        self.add(record)
    }

    fn record_removed(&self, record: &[u8]) -> Result<(), AccumulatorError> {
        self.remove(record)
    }

    fn records_changed(&self, batch: &MutationBatch) -> Result<(), AccumulatorError> {
        self.apply_batch(batch).map(|_| ())
    }
}
