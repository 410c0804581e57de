//! Bulk transformations over particle tiles
//!
//! Every operation follows the same shape: validate the requested ranges
//! against both tiles, capture the tile views, run one index-parallel loop on
//! the destination tile's executor and return once that loop has completed.
//! Stream compaction adds a prefix sum and a single count read-back between
//! mask construction and the compacting loop.

pub mod copy;
pub mod filter;
pub mod permute;
pub mod predicate;
pub mod range;

pub use copy::{
    copy_particles, copy_particles_range, transform_particles, transform_particles_dual,
    transform_particles_dual_range, transform_particles_range,
};
pub use filter::{
    filter_and_transform_particles, filter_and_transform_particles_at,
    filter_and_transform_particles_dual, filter_and_transform_particles_dual_where,
    filter_and_transform_particles_where, filter_and_transform_particles_where_at, filter_particles,
    filter_particles_range, filter_particles_where, filter_particles_where_range,
};
pub use permute::{gather_particles, scatter_particles, ParticleIndex};
pub use predicate::{KeepRule, Predicate, StochasticPredicate};
pub use range::{DualTransferRange, TransferRange};
