//! Execution layer for bulk tile operations
//!
//! Provides the four primitives the transformation engine is built on:
//! - index-parallel for-each with a closing barrier
//! - exclusive prefix sum over a keep mask
//! - the blocking count read-back that finalizes a compaction
//! - independent per-index random streams

pub mod executor;
pub mod random;
pub mod scan;

pub use executor::{ExecEvent, ExecStats, Executor};
pub use random::RandomContext;
pub use scan::MaskFlag;
