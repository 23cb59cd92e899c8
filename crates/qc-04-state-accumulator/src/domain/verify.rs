//! # Snapshot Verification
//!
//! A node syncing from a peer receives a full record set plus a claimed
//! checksum. Accepting it takes three independent checks:
//!
//! 1. The claimed checksum decodes to a group element.
//! 2. The claimed checksum is backed by an authority independent of the
//!    peer that sent the records: a commitment in an authenticated header,
//!    or agreement among enough distinct peers.
//! 3. A fresh accumulator rebuilt from the received records matches it.
//!
//! ## Threat
//!
//! The accumulator is an unkeyed additive commitment. Anyone can compute
//! the checksum of any record set, so a peer that controls both the records
//! and the checksum can always make step 3 pass. Step 2 is what binds the
//! snapshot to the canonical chain.

use super::checksum::{Checksum, ChecksumEnvelope, CHECKSUM_LEN};
use super::config::{AccumulatorConfig, CHECKSUM_FORMAT_VERSION, DEFAULT_DOMAIN_TAG};
use super::errors::VerifyError;
use super::parallel::{accumulate_parallel, PARALLEL_THRESHOLD};
use super::Hash;
use shared_crypto::{PrimeOrderGroup, Ristretto255};
use std::collections::HashSet;
use std::marker::PhantomData;
use subtle::ConstantTimeEq;

/// Network identity of the peer behind an attestation.
pub type PeerId = [u8; 32];

/// A peer's claim about the checksum at a given height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerAttestation {
    pub peer: PeerId,
    pub checksum: Checksum,
}

/// Independent source vouching for a claimed checksum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChecksumAuthority {
    /// `Checksum::commitment()` taken from an authenticated block header.
    HeaderCommitment(Hash),
    /// At least `threshold` distinct peers reported the claimed checksum.
    PeerQuorum {
        attestations: Vec<PeerAttestation>,
        threshold: usize,
    },
}

/// A snapshot that passed every check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifiedSnapshot {
    pub checksum: Checksum,
    pub record_count: u64,
}

/// Rebuilds and checks transferred snapshots.
pub struct SnapshotVerifier<G: PrimeOrderGroup = Ristretto255> {
    domain_tag: Vec<u8>,
    parallel_threshold: usize,
    _group: PhantomData<G>,
}

impl<G> SnapshotVerifier<G>
where
    G: PrimeOrderGroup<Encoding = [u8; CHECKSUM_LEN]>,
{
    pub fn new(domain_tag: impl Into<Vec<u8>>) -> Self {
        Self {
            domain_tag: domain_tag.into(),
            parallel_threshold: PARALLEL_THRESHOLD,
            _group: PhantomData,
        }
    }

    pub fn from_config(config: &AccumulatorConfig) -> Self {
        Self {
            domain_tag: config.domain_tag.clone(),
            parallel_threshold: config.parallel_threshold,
            _group: PhantomData,
        }
    }

    /// Verify a snapshot held in memory. Records are mapped in parallel.
    pub fn verify<R: AsRef<[u8]> + Sync>(
        &self,
        records: &[R],
        envelope: &ChecksumEnvelope,
        authority: &ChecksumAuthority,
    ) -> Result<VerifiedSnapshot, VerifyError> {
        self.check_claim(envelope, authority)?;
        self.check_count(envelope, records.len() as u64)?;

        let rebuilt = accumulate_parallel::<G, R>(records, &self.domain_tag, self.parallel_threshold);
        self.check_rebuilt(envelope, &rebuilt)
    }

    /// Verify a snapshot streamed from storage, one record at a time.
    pub fn verify_stream<I>(
        &self,
        records: I,
        envelope: &ChecksumEnvelope,
        authority: &ChecksumAuthority,
    ) -> Result<VerifiedSnapshot, VerifyError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.check_claim(envelope, authority)?;

        let mut rebuilt = G::identity();
        let mut count = 0u64;
        for record in records {
            let point = G::map_to_group(record.as_ref(), &self.domain_tag);
            rebuilt = G::add(&rebuilt, &point);
            count += 1;
        }

        self.check_count(envelope, count)?;
        self.check_rebuilt(envelope, &rebuilt)
    }

    fn check_claim(
        &self,
        envelope: &ChecksumEnvelope,
        authority: &ChecksumAuthority,
    ) -> Result<(), VerifyError> {
        if envelope.format_version != CHECKSUM_FORMAT_VERSION {
            return Err(VerifyError::UnsupportedFormatVersion(envelope.format_version));
        }

        G::decode(envelope.checksum.as_bytes())?;

        check_authority(&envelope.checksum, authority)
    }

    fn check_count(&self, envelope: &ChecksumEnvelope, actual: u64) -> Result<(), VerifyError> {
        if envelope.record_count != actual {
            return Err(VerifyError::RecordCountMismatch {
                claimed: envelope.record_count,
                actual,
            });
        }
        Ok(())
    }

    fn check_rebuilt(
        &self,
        envelope: &ChecksumEnvelope,
        rebuilt: &G::Element,
    ) -> Result<VerifiedSnapshot, VerifyError> {
        let recomputed = Checksum::from_bytes(G::encode(rebuilt));

        if !bool::from(recomputed.ct_eq(&envelope.checksum)) {
            return Err(VerifyError::ChecksumMismatch {
                claimed: envelope.checksum,
                recomputed,
            });
        }

        Ok(VerifiedSnapshot {
            checksum: recomputed,
            record_count: envelope.record_count,
        })
    }
}

impl Default for SnapshotVerifier<Ristretto255> {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN_TAG)
    }
}

/// Check a claimed checksum against an independent authority.
pub fn check_authority(claimed: &Checksum, authority: &ChecksumAuthority) -> Result<(), VerifyError> {
    match authority {
        ChecksumAuthority::HeaderCommitment(commitment) => {
            if !bool::from(claimed.commitment()[..].ct_eq(&commitment[..])) {
                return Err(VerifyError::UntrustedChecksum);
            }
            Ok(())
        }
        ChecksumAuthority::PeerQuorum {
            attestations,
            threshold,
        } => {
            // A zero threshold would accept anything.
            let required = (*threshold).max(1);

            let agreeing = attestations
                .iter()
                .filter(|a| bool::from(a.checksum.ct_eq(claimed)))
                .map(|a| a.peer)
                .collect::<HashSet<_>>()
                .len();

            if agreeing < required {
                return Err(VerifyError::InsufficientQuorum { agreeing, required });
            }
            Ok(())
        }
    }
}
