//! # qc-04-state-accumulator
//!
//! State integrity layer for Quantum-Chain: an incremental, order-independent
//! checksum over the ledger's key/value records.
//!
//! ## Role in System
//!
//! - **Choreography Participant**: Subscribes to `BlockStateChanges`, publishes
//!   `StateChecksumComputed`
//! - **Divergence Detection**: Two nodes with the same active records hold the
//!   same 32-byte checksum, regardless of mutation order
//! - **Snapshot Sync**: Rebuilds and checks transferred state against an
//!   authenticated checksum
//!
//! ## Flow
//!
//! ```text
//! [Storage engine] ──record added/removed──→ Hash-to-Group (parallel)
//!                                                  │
//!                                                  ↓
//!                                       MultisetHash (sequential add)
//!                                                  │
//!                                       checksum() on demand
//!                                                  │
//!                     ┌────────────────────────────┴──────────────┐
//!                     ↓                                           ↓
//!          StateChecksumComputed                        SnapshotVerifier
//!          (commitment → header)                        (peer sync)
//! ```
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): `MultisetHash`, `Checksum`, `MutationBatch`,
//!   `SnapshotVerifier`, `AccumulatorConfig`
//! - **Ports** (`ports/`): `StateAccumulatorApi` (inbound), `StateChangeSink` (outbound)
//! - **Service** (`service/`): `SharedAccumulator`, `AccumulatorTask`,
//!   `StateAccumulatorService`
//! - **Adapters** (`adapters/`): `TrackedStateStore`
//! - **Events** (`events/`): bus payloads
//!
//! ## Security
//!
//! The checksum is an unkeyed commitment: anyone can compute the checksum of
//! any record set. It only proves something when paired with an independent
//! authority (header commitment or peer quorum).

pub mod adapters;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{encode_record, TrackedStateStore};
pub use domain::*;
pub use events::*;
pub use metrics::{AccumulatorMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{StateAccumulatorApi, StateChangeSink};
pub use service::{
    spawn, AccumulatorCommand, AccumulatorHandle, AccumulatorTask, BatchOutcome, Lifecycle,
    SharedAccumulator, StateAccumulatorService,
};
