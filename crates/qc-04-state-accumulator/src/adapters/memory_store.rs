//! # Tracked In-Memory State Store
//!
//! Key/value store that reports every record change to a `StateChangeSink`.
//! It stands in for the real storage engine in tests and tooling.
//!
//! ## Record Encoding
//!
//! Each entry becomes one record:
//!
//! ```text
//! | key_len: u32 BE | key | value_len: u32 BE | value |
//! ```
//!
//! Length prefixes keep `("ab", "c")` and `("a", "bc")` distinct.
//!
//! Overwriting a key submits the removal of the old record and the addition
//! of the new one as a single batch, so the sink only ever sees balanced
//! removes and a failed overwrite leaves both sides untouched.

use crate::domain::{AccumulatorError, MutationBatch};
use crate::ports::StateChangeSink;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Canonical record bytes for a key/value pair.
pub fn encode_record(key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(8 + key.len() + value.len());
    record.extend_from_slice(&(key.len() as u32).to_be_bytes());
    record.extend_from_slice(key);
    record.extend_from_slice(&(value.len() as u32).to_be_bytes());
    record.extend_from_slice(value);
    record
}

/// In-memory key/value store wired to an accumulator.
pub struct TrackedStateStore<S: StateChangeSink> {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    sink: Arc<S>,
}

impl<S: StateChangeSink> TrackedStateStore<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            sink,
        }
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, AccumulatorError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AccumulatorError::ConcurrencyViolation)?;
        Ok(entries.get(key).cloned())
    }

    /// Insert or overwrite. Returns the previous value.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<Option<Vec<u8>>, AccumulatorError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AccumulatorError::ConcurrencyViolation)?;

        let previous = entries.get(key).cloned();
        match &previous {
            Some(old) if old.as_slice() == value => return Ok(Some(value.to_vec())),
            Some(old) => {
                let mut overwrite = MutationBatch::new();
                overwrite
                    .remove(encode_record(key, old))
                    .add(encode_record(key, value));
                self.sink.records_changed(&overwrite)?;
            }
            None => self.sink.record_added(&encode_record(key, value))?,
        }
        entries.insert(key.to_vec(), value.to_vec());

        debug!("[qc-04] Store put: key {}", hex::encode(key));
        Ok(previous)
    }

    /// Remove a key. Returns the removed value.
    pub fn delete(&self, key: &[u8]) -> Result<Option<Vec<u8>>, AccumulatorError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AccumulatorError::ConcurrencyViolation)?;

        let Some(old) = entries.get(key).cloned() else {
            return Ok(None);
        };
        self.sink.record_removed(&encode_record(key, &old))?;
        entries.remove(key);

        debug!("[qc-04] Store delete: key {}", hex::encode(key));
        Ok(Some(old))
    }

    pub fn len(&self) -> Result<usize, AccumulatorError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AccumulatorError::ConcurrencyViolation)?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, AccumulatorError> {
        Ok(self.len()? == 0)
    }

    /// Every current entry as a record, for snapshot transfer.
    pub fn records(&self) -> Result<Vec<Vec<u8>>, AccumulatorError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AccumulatorError::ConcurrencyViolation)?;
        Ok(entries
            .iter()
            .map(|(key, value)| encode_record(key, value))
            .collect())
    }

    /// Mutations a `put` would produce, without applying it. Lets a block
    /// builder assemble a `MutationBatch` ahead of time.
    pub fn plan_put(&self, key: &[u8], value: &[u8], batch: &mut MutationBatch) -> Result<(), AccumulatorError> {
        if let Some(old) = self.get(key)? {
            if old == value {
                return Ok(());
            }
            batch.remove(encode_record(key, &old));
        }
        batch.add(encode_record(key, value));
        Ok(())
    }
}
