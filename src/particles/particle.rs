/// Real attribute type
pub type ParticleReal = f64;

/// Integer attribute type
pub type ParticleInt = i32;

/// Number of spatial dimensions of a particle position
pub const SPACEDIM: usize = 3;

/// Structured per-record payload stored array-of-structures in a tile.
///
/// Anything plain-old-data-like qualifies; the engine only ever copies it.
pub trait Particle: Copy + Default + Send + Sync + 'static {}

impl<T> Particle for T where T: Copy + Default + Send + Sync + 'static {}

/// Default payload: position, `NSR` extra reals, id/cpu pair, `NSI` extra ints
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleParticle<const NSR: usize, const NSI: usize> {
    pub pos: [ParticleReal; SPACEDIM],
    pub rdata: [ParticleReal; NSR],
    pub id: i64,
    pub cpu: i32,
    pub idata: [ParticleInt; NSI],
}

impl<const NSR: usize, const NSI: usize> Default for SimpleParticle<NSR, NSI> {
    fn default() -> Self {
        Self {
            pos: [0.0; SPACEDIM],
            rdata: [0.0; NSR],
            id: 0,
            cpu: 0,
            idata: [0; NSI],
        }
    }
}

impl<const NSR: usize, const NSI: usize> SimpleParticle<NSR, NSI> {
    /// Create a particle at `pos` with all struct attributes zeroed
    pub fn new(pos: [ParticleReal; SPACEDIM], id: i64, cpu: i32) -> Self {
        Self {
            pos,
            id,
            cpu,
            ..Self::default()
        }
    }

    pub fn with_rdata(mut self, rdata: [ParticleReal; NSR]) -> Self {
        self.rdata = rdata;
        self
    }

    pub fn with_idata(mut self, idata: [ParticleInt; NSI]) -> Self {
        self.idata = idata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_particle<P: Particle>() {}

    #[test]
    fn test_simple_particle_is_a_payload() {
        assert_particle::<SimpleParticle<0, 0>>();
        assert_particle::<SimpleParticle<2, 1>>();
        assert_particle::<u64>();
    }

    #[test]
    fn test_builders() {
        let p = SimpleParticle::<2, 1>::new([1.0, 2.0, 3.0], 42, 0)
            .with_rdata([0.5, 0.25])
            .with_idata([7]);
        assert_eq!(p.pos, [1.0, 2.0, 3.0]);
        assert_eq!(p.rdata, [0.5, 0.25]);
        assert_eq!(p.idata, [7]);
        assert_eq!(p.id, 42);
        assert_eq!(SimpleParticle::<1, 1>::default().idata, [0]);
    }
}
