pub mod accumulator;
pub mod batch;
pub mod checksum;
pub mod config;
pub mod errors;
pub mod parallel;
pub mod verify;

pub use accumulator::*;
pub use batch::*;
pub use checksum::*;
pub use config::*;
pub use errors::*;
pub use parallel::*;
pub use verify::*;

/// 32-byte hash (Keccak256 commitments, block hashes).
pub type Hash = [u8; 32];
