//! Particle tile transformations
//!
//! Data-parallel primitives that move particle records between
//! structure-of-arrays tiles: per-record copy and swap, bulk copy and
//! transform, mask or predicate driven stream compaction, and index-driven
//! gather and scatter. Every bulk call runs on the destination tile's
//! [`Executor`] and has fully completed when it returns.

pub mod config;
pub mod error;
pub mod exec;
pub mod particles;
pub mod transform;

pub use config::{ExecConfig, ExecutionSpace};
pub use error::{TransformError, TransformResult};
pub use exec::{ExecEvent, ExecStats, Executor, MaskFlag, RandomContext};
pub use particles::{
    copy_particle, swap_particle, swap_particle_within, ConstParticleTileData, Particle, ParticleInt,
    ParticleReal, ParticleRecord, ParticleSlot, ParticleTile, ParticleTileData, SimpleParticle, SPACEDIM,
};
pub use transform::{
    copy_particles, copy_particles_range, filter_and_transform_particles, filter_and_transform_particles_at,
    filter_and_transform_particles_dual, filter_and_transform_particles_dual_where,
    filter_and_transform_particles_where, filter_and_transform_particles_where_at, filter_particles,
    filter_particles_range, filter_particles_where, filter_particles_where_range, gather_particles,
    scatter_particles, transform_particles, transform_particles_dual, transform_particles_dual_range,
    transform_particles_range, DualTransferRange, KeepRule, ParticleIndex, Predicate, StochasticPredicate,
    TransferRange,
};
