//! Service Layer
//!
//! - `SharedAccumulator`: lock-guarded accumulator with lifecycle checks
//! - `AccumulatorTask` / `AccumulatorHandle`: single-owner tokio task
//! - `StateAccumulatorService`: implements `StateAccumulatorApi`

pub mod accumulator_service;
pub mod actor;
pub mod shared;

pub use accumulator_service::StateAccumulatorService;
pub use actor::{spawn, AccumulatorCommand, AccumulatorHandle, AccumulatorTask};
pub use shared::{BatchOutcome, Lifecycle, SharedAccumulator};
