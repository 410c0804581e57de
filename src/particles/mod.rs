pub mod particle;
pub mod particle_data;
pub mod record_ops;
pub mod tile_data;

pub use particle::{Particle, ParticleInt, ParticleReal, SimpleParticle, SPACEDIM};
pub use particle_data::{ParticleRecord, ParticleTile};
pub use record_ops::{copy_particle, swap_particle, swap_particle_within};
pub use tile_data::{ConstParticleTileData, ParticleSlot, ParticleTileData};
