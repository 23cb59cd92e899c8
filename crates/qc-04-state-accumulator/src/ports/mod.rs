//! Ports Layer
//!
//! - Driving port (inbound): `StateAccumulatorApi`
//! - Driven port (outbound): `StateChangeSink`, fed by the state store

pub mod api;
pub mod sink;

pub use api::StateAccumulatorApi;
pub use sink::StateChangeSink;
