//! # Parallel Record Mapping
//!
//! Hash-to-group is the expensive step of every mutation, and it is a pure
//! function of the record bytes. A block touching thousands of records can
//! therefore map them concurrently and only fold the results sequentially.
//!
//! ## Map-Reduce Commit
//!
//! 1. Map (parallel): `record -> point` (or `-point` for removals)
//! 2. Reduce: sum the points into one delta
//! 3. Apply: a single group addition against the live accumulator
//!
//! Below `threshold` the map runs sequentially; rayon's fork overhead
//! dominates for small batches.

use super::batch::StateMutation;
use rayon::prelude::*;
use shared_crypto::PrimeOrderGroup;

/// Default batch size at which mapping switches to rayon.
pub const PARALLEL_THRESHOLD: usize = 64;

/// Map every record to its group element, preserving input order.
pub fn map_records_parallel<G, R>(records: &[R], domain_tag: &[u8], threshold: usize) -> Vec<G::Element>
where
    G: PrimeOrderGroup,
    R: AsRef<[u8]> + Sync,
{
    if records.len() < threshold {
        records
            .iter()
            .map(|record| G::map_to_group(record.as_ref(), domain_tag))
            .collect()
    } else {
        records
            .par_iter()
            .map(|record| G::map_to_group(record.as_ref(), domain_tag))
            .collect()
    }
}

/// Map a mutation list to the signed points it contributes.
pub fn map_mutations_parallel<G>(
    mutations: &[StateMutation],
    domain_tag: &[u8],
    threshold: usize,
) -> Vec<G::Element>
where
    G: PrimeOrderGroup,
{
    let signed = |mutation: &StateMutation| {
        let point = G::map_to_group(mutation.record(), domain_tag);
        match mutation {
            StateMutation::Added(_) => point,
            StateMutation::Removed(_) => G::negate(&point),
        }
    };

    if mutations.len() < threshold {
        mutations.iter().map(signed).collect()
    } else {
        mutations.par_iter().map(signed).collect()
    }
}

/// Sum of the mapped records: the delta a batch of additions contributes.
pub fn accumulate_parallel<G, R>(records: &[R], domain_tag: &[u8], threshold: usize) -> G::Element
where
    G: PrimeOrderGroup,
    R: AsRef<[u8]> + Sync,
{
    sum::<G>(map_records_parallel::<G, R>(records, domain_tag, threshold))
}

/// Sequential fold of mapped points.
pub fn sum<G: PrimeOrderGroup>(points: impl IntoIterator<Item = G::Element>) -> G::Element {
    points
        .into_iter()
        .fold(G::identity(), |acc, point| G::add(&acc, &point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::Ristretto255;

    const TAG: &[u8] = b"QC-04-PARALLEL-TEST";

    fn records(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| format!("record-{}", i).into_bytes()).collect()
    }

    #[test]
    fn test_parallel_threshold() {
        assert!(PARALLEL_THRESHOLD >= 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let records = records(100);
        let sequential = map_records_parallel::<Ristretto255, _>(&records, TAG, usize::MAX);
        let parallel = map_records_parallel::<Ristretto255, _>(&records, TAG, 1);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_accumulate_empty_is_identity() {
        let empty: Vec<Vec<u8>> = Vec::new();
        assert_eq!(
            accumulate_parallel::<Ristretto255, _>(&empty, TAG, 1),
            Ristretto255::identity()
        );
    }

    #[test]
    fn test_mutations_cancel() {
        let mutations = vec![
            StateMutation::Added(b"x".to_vec()),
            StateMutation::Removed(b"x".to_vec()),
        ];
        let delta = sum::<Ristretto255>(map_mutations_parallel::<Ristretto255>(&mutations, TAG, 1));
        assert_eq!(delta, Ristretto255::identity());
    }

    #[test]
    fn test_accumulate_order_independent() {
        let forward = records(70);
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(
            accumulate_parallel::<Ristretto255, _>(&forward, TAG, 8),
            accumulate_parallel::<Ristretto255, _>(&reversed, TAG, 8)
        );
    }
}
