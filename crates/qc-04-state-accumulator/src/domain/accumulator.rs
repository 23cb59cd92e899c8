//! # Multiset Hash
//!
//! The accumulator is a single group element: the sum of the mapped points
//! of every active record.
//!
//! ```text
//! add(r):    state = state + H(r)
//! remove(r): state = state - H(r)
//! ```
//!
//! Since the group is abelian the value depends only on the multiset of
//! active records, never on the order of mutations, and `add` followed by
//! `remove` of the same record restores the previous value exactly.
//!
//! ## Caveat
//!
//! Removing a record that was never added is not detectable here; the
//! result is simply a different group element. Callers own that
//! bookkeeping (see `TrackedStateStore`).

use super::checksum::{Checksum, CHECKSUM_LEN};
use super::config::DEFAULT_DOMAIN_TAG;
use super::errors::AccumulatorError;
use super::parallel::{accumulate_parallel, PARALLEL_THRESHOLD};
use shared_crypto::{PrimeOrderGroup, Ristretto255};
use std::fmt;
use std::marker::PhantomData;
use subtle::{Choice, ConstantTimeEq};

/// Incremental, order-independent checksum over a multiset of records.
///
/// Mutation takes `&mut self`; share it through `SharedAccumulator` or
/// `AccumulatorHandle`.
pub struct MultisetHash<G: PrimeOrderGroup = Ristretto255> {
    state: G::Element,
    domain_tag: Vec<u8>,
    _group: PhantomData<G>,
}

impl<G> MultisetHash<G>
where
    G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]>,
{
    /// Identity accumulator (empty state) under `domain_tag`.
    pub fn new(domain_tag: impl Into<Vec<u8>>) -> Self {
        Self {
            state: G::identity(),
            domain_tag: domain_tag.into(),
            _group: PhantomData,
        }
    }

    /// Resume from a persisted checksum. Fails if the bytes are not a
    /// canonical group element.
    pub fn from_checksum(
        checksum: &Checksum,
        domain_tag: impl Into<Vec<u8>>,
    ) -> Result<Self, AccumulatorError> {
        let state = G::decode(checksum.as_bytes())?;
        Ok(Self {
            state,
            domain_tag: domain_tag.into(),
            _group: PhantomData,
        })
    }

    /// Reset to the identity.
    pub fn initialize(&mut self) {
        self.state = G::identity();
    }

    pub fn domain_tag(&self) -> &[u8] {
        &self.domain_tag
    }

    /// Raw group element.
    pub fn element(&self) -> G::Element {
        self.state
    }

    /// Hash a record under this accumulator's tag without touching state.
    pub fn map_record(&self, record: &[u8]) -> G::Element {
        G::map_to_group(record, &self.domain_tag)
    }

    pub fn add_bytes(&mut self, record: &[u8]) {
        let point = self.map_record(record);
        self.add_element(&point);
    }

    pub fn remove_bytes(&mut self, record: &[u8]) {
        let point = self.map_record(record);
        self.remove_element(&point);
    }

    /// Add a point produced by `map_record` (or the parallel mapper).
    pub fn add_element(&mut self, point: &G::Element) {
        self.state = G::add(&self.state, point);
    }

    pub fn remove_element(&mut self, point: &G::Element) {
        self.state = G::add(&self.state, &G::negate(point));
    }

    /// Add many records, mapping them in parallel once the batch is large.
    pub fn add_all<R: AsRef<[u8]> + Sync>(&mut self, records: &[R]) {
        let delta = accumulate_parallel::<G, R>(records, &self.domain_tag, PARALLEL_THRESHOLD);
        self.add_element(&delta);
    }

    /// Merge another accumulator: the result covers the union of both
    /// multisets.
    pub fn combine(&mut self, other: &Self) -> Result<(), AccumulatorError> {
        self.ensure_same_tag(other)?;
        self.add_element(&other.state);
        Ok(())
    }

    /// Inverse of `combine`.
    pub fn subtract(&mut self, other: &Self) -> Result<(), AccumulatorError> {
        self.ensure_same_tag(other)?;
        self.remove_element(&other.state);
        Ok(())
    }

    /// Canonical encoding of the current value.
    pub fn checksum(&self) -> Checksum {
        Checksum::from_bytes(G::encode(&self.state))
    }

    pub fn is_identity(&self) -> bool {
        self.checksum().is_identity()
    }

    fn ensure_same_tag(&self, other: &Self) -> Result<(), AccumulatorError> {
        if self.domain_tag != other.domain_tag {
            return Err(AccumulatorError::DomainTagMismatch);
        }
        Ok(())
    }
}

impl<G> Default for MultisetHash<G>
where
    G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]>,
{
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN_TAG)
    }
}

impl<G: PrimeOrderGroup> Clone for MultisetHash<G> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            domain_tag: self.domain_tag.clone(),
            _group: PhantomData,
        }
    }
}

/// Compares canonical encodings in constant time. Accumulators under
/// different tags are never equal.
impl<G> ConstantTimeEq for MultisetHash<G>
where
    G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]>,
{
    fn ct_eq(&self, other: &Self) -> Choice {
        let same_tag = Choice::from((self.domain_tag == other.domain_tag) as u8);
        self.checksum().ct_eq(&other.checksum()) & same_tag
    }
}

impl<G> PartialEq for MultisetHash<G>
where
    G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]>,
{
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl<G> Eq for MultisetHash<G> where G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]> {}

impl<G> fmt::Debug for MultisetHash<G>
where
    G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultisetHash")
            .field("checksum", &self.checksum())
            .field("domain_tag", &String::from_utf8_lossy(&self.domain_tag))
            .finish()
    }
}
