//! Adapters Layer
//!
//! - `TrackedStateStore`: in-memory key/value store feeding a `StateChangeSink`

pub mod memory_store;

pub use memory_store::{encode_record, TrackedStateStore};
