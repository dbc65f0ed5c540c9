//! Static analysis over parsed Samsara code.
//!
//! - `tails`: tail-position classification for one function body.
//! - `registry`: per-region function registry used to validate tail-call
//!   wiring at transform time.

pub mod registry;
pub mod tails;

pub use registry::{FnEntry, RegionRegistry};
pub use tails::{analyze, TailPositions};
