//! # Mutation Batches
//!
//! A block's state changes arrive as a list of record additions and
//! removals. The accumulator keeps no rollback log; aborting a batch (or
//! reverting a block on reorg) replays the exact inverse mutations, in
//! reverse order, on the caller side.

use super::accumulator::MultisetHash;
use super::checksum::CHECKSUM_LEN;
use serde::{Deserialize, Serialize};
use shared_crypto::PrimeOrderGroup;

/// One change to the active record multiset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateMutation {
    Added(Vec<u8>),
    Removed(Vec<u8>),
}

impl StateMutation {
    pub fn record(&self) -> &[u8] {
        match self {
            StateMutation::Added(record) | StateMutation::Removed(record) => record,
        }
    }

    /// The mutation that undoes this one.
    pub fn inverse(&self) -> Self {
        match self {
            StateMutation::Added(record) => StateMutation::Removed(record.clone()),
            StateMutation::Removed(record) => StateMutation::Added(record.clone()),
        }
    }

    pub fn apply_to<G>(&self, hash: &mut MultisetHash<G>)
    where
        G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]>,
    {
        match self {
            StateMutation::Added(record) => hash.add_bytes(record),
            StateMutation::Removed(record) => hash.remove_bytes(record),
        }
    }
}

/// Ordered list of mutations applied as a unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationBatch {
    mutations: Vec<StateMutation>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: impl Into<Vec<u8>>) -> &mut Self {
        self.mutations.push(StateMutation::Added(record.into()));
        self
    }

    pub fn remove(&mut self, record: impl Into<Vec<u8>>) -> &mut Self {
        self.mutations.push(StateMutation::Removed(record.into()));
        self
    }

    pub fn push(&mut self, mutation: StateMutation) {
        self.mutations.push(mutation);
    }

    pub fn mutations(&self) -> &[StateMutation] {
        &self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.mutations
            .iter()
            .filter(|m| matches!(m, StateMutation::Added(_)))
            .count()
    }

    pub fn removals(&self) -> usize {
        self.len() - self.additions()
    }

    /// Inverse batch: each mutation inverted, in reverse order.
    pub fn inverse(&self) -> Self {
        Self {
            mutations: self.mutations.iter().rev().map(StateMutation::inverse).collect(),
        }
    }

    pub fn apply<G>(&self, hash: &mut MultisetHash<G>)
    where
        G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]>,
    {
        for mutation in &self.mutations {
            mutation.apply_to(hash);
        }
    }

    /// Undo a previously applied batch.
    pub fn revert<G>(&self, hash: &mut MultisetHash<G>)
    where
        G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]>,
    {
        for mutation in self.mutations.iter().rev() {
            mutation.inverse().apply_to(hash);
        }
    }
}

impl FromIterator<StateMutation> for MutationBatch {
    fn from_iter<I: IntoIterator<Item = StateMutation>>(iter: I) -> Self {
        Self {
            mutations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &[u8] = b"QC-04-BATCH-TEST";

    #[test]
    fn test_inverse_mutation() {
        let add = StateMutation::Added(b"x".to_vec());
        assert_eq!(add.inverse(), StateMutation::Removed(b"x".to_vec()));
        assert_eq!(add.inverse().inverse(), add);
    }

    #[test]
    fn test_batch_counts() {
        let mut batch = MutationBatch::new();
        batch.add(b"a".to_vec()).add(b"b".to_vec()).remove(b"c".to_vec());

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.additions(), 2);
        assert_eq!(batch.removals(), 1);
    }

    #[test]
    fn test_inverse_batch_order() {
        let mut batch = MutationBatch::new();
        batch.add(b"a".to_vec()).remove(b"b".to_vec());

        let inverse = batch.inverse();
        assert_eq!(
            inverse.mutations(),
            &[
                StateMutation::Added(b"b".to_vec()),
                StateMutation::Removed(b"a".to_vec()),
            ]
        );
    }

    #[test]
    fn test_revert_restores_checksum() {
        let mut hash: MultisetHash = MultisetHash::new(TAG);
        hash.add_bytes(b"genesis");
        let before = hash.checksum();

        let mut batch = MutationBatch::new();
        batch
            .add(b"x".to_vec())
            .remove(b"genesis".to_vec())
            .add(b"y".to_vec());

        batch.apply(&mut hash);
        assert_ne!(hash.checksum(), before);

        batch.revert(&mut hash);
        assert_eq!(hash.checksum(), before);
    }

    #[test]
    fn test_applying_inverse_equals_revert() {
        let mut batch = MutationBatch::new();
        batch.add(b"p".to_vec()).add(b"q".to_vec());

        let mut a: MultisetHash = MultisetHash::new(TAG);
        batch.apply(&mut a);
        batch.inverse().apply(&mut a);

        assert!(a.is_identity());
    }
}
