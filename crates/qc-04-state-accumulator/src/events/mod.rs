//! # Event Payloads for the State Accumulator
//!
//! ## Choreography Events
//!
//! - `BlockStateChangesPayload`: Received once a block's state changes are final
//! - `StateChecksumComputedPayload`: Published after each applied or reverted block
//!
//! ## Snapshot Sync
//!
//! - `SnapshotChecksumPayload`: Exchanged between peers during state sync

pub mod payloads;

pub use payloads::*;
