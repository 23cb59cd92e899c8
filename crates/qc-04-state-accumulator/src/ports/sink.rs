//! Outbound port for record mutation events.
//!
//! The storage engine is a black box. Its only obligation is to report
//! every record it adds or removes, with the exact bytes, exactly once.

use crate::domain::{AccumulatorError, MutationBatch};

/// Receives "record added" / "record removed" events.
pub trait StateChangeSink: Send + Sync {
    fn record_added(&self, record: &[u8]) -> Result<(), AccumulatorError>;

    fn record_removed(&self, record: &[u8]) -> Result<(), AccumulatorError>;

    /// Apply several mutations as one unit. Either all of them land or none.
    fn records_changed(&self, batch: &MutationBatch) -> Result<(), AccumulatorError>;
}
