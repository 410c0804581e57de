//! Per-record operators
//!
//! Both operators move a record in lock-step across the payload, the fixed
//! attribute columns and the runtime attribute columns. They panic if the two
//! views disagree on their runtime attribute counts or if an index is out of
//! range.

use super::particle::Particle;
use super::tile_data::{ConstParticleTileData, ParticleTileData};

/// Copy the full record at `src_i` of `src` to slot `dst_i` of `dst`.
///
/// A mutable source view is passed through [`ParticleTileData::as_const`].
pub fn copy_particle<P: Particle, const NAR: usize, const NAI: usize>(
    dst: &mut ParticleTileData<'_, P, NAR, NAI>,
    src: &ConstParticleTileData<'_, P, NAR, NAI>,
    src_i: usize,
    dst_i: usize,
) {
    dst.slot(dst_i).copy_from(src, src_i);
}

/// Exchange the full records at slot `i` of `a` and slot `j` of `b`
pub fn swap_particle<P: Particle, const NAR: usize, const NAI: usize>(
    a: &mut ParticleTileData<'_, P, NAR, NAI>,
    b: &mut ParticleTileData<'_, P, NAR, NAI>,
    i: usize,
    j: usize,
) {
    let mut slot_a = a.slot(i);
    let mut slot_b = b.slot(j);
    slot_a.swap_with(&mut slot_b);
}

/// Exchange the full records at slots `i` and `j` of the same view
pub fn swap_particle_within<P: Particle, const NAR: usize, const NAI: usize>(
    a: &mut ParticleTileData<'_, P, NAR, NAI>,
    i: usize,
    j: usize,
) {
    a.swap(i, j);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Executor;
    use crate::particles::{ParticleTile, SimpleParticle};
    use std::sync::Arc;

    type Tile = ParticleTile<SimpleParticle<0, 1>, 1, 1>;

    fn tile(values: &[i32], runtime_real: usize) -> Tile {
        let mut tile = Tile::with_executor(Arc::new(Executor::serial()), runtime_real, 1);
        for &v in values {
            let p = SimpleParticle::new([v as f64; 3], v as i64, 0).with_idata([v]);
            tile.push(p, [v as f64 * 0.5], [v]);
            let last = tile.num_particles() - 1;
            for comp in 0..runtime_real {
                tile.runtime_real_column_mut(comp)[last] = v as f64 + comp as f64;
            }
            tile.runtime_int_column_mut(0)[last] = -v;
        }
        tile
    }

    #[test]
    fn test_copy_particle_moves_every_column() {
        let src = tile(&[1, 2, 3], 2);
        let mut dst = tile(&[0, 0], 2);

        let src_view = src.const_particle_tile_data();
        copy_particle(&mut dst.particle_tile_data(), &src_view, 2, 1);

        assert_eq!(dst.record(1), src.record(2));
        assert_eq!(dst.record(0), tile(&[0], 2).record(0));
    }

    #[test]
    fn test_copy_from_mutable_source() {
        let mut src = tile(&[5, 6], 1);
        let mut dst = tile(&[0], 1);
        {
            let src_view = src.particle_tile_data();
            copy_particle(&mut dst.particle_tile_data(), &src_view.as_const(), 1, 0);
        }
        assert_eq!(dst.record(0), src.record(1));
    }

    #[test]
    #[should_panic(expected = "runtime real attribute count mismatch")]
    fn test_copy_particle_rejects_mismatched_runtime_counts() {
        let src = tile(&[1], 2);
        let mut dst = tile(&[0], 1);
        copy_particle(&mut dst.particle_tile_data(), &src.const_particle_tile_data(), 0, 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_copy_particle_rejects_bad_destination() {
        let src = tile(&[1], 0);
        let mut dst = tile(&[0], 0);
        copy_particle(&mut dst.particle_tile_data(), &src.const_particle_tile_data(), 0, 3);
    }

    #[test]
    fn test_swap_is_an_involution() {
        let mut a = tile(&[1, 2, 3], 1);
        let mut b = tile(&[10, 20], 1);
        let (a0, b0) = (a.records(), b.records());

        swap_particle(&mut a.particle_tile_data(), &mut b.particle_tile_data(), 2, 0);
        assert_eq!(a.record(2), b0[0]);
        assert_eq!(b.record(0), a0[2]);

        swap_particle(&mut a.particle_tile_data(), &mut b.particle_tile_data(), 2, 0);
        assert_eq!(a.records(), a0);
        assert_eq!(b.records(), b0);
    }

    #[test]
    fn test_swap_within_one_tile() {
        let mut a = tile(&[1, 2, 3], 1);
        let original = a.records();

        swap_particle_within(&mut a.particle_tile_data(), 0, 2);
        assert_eq!(a.record(0), original[2]);
        assert_eq!(a.record(2), original[0]);
        assert_eq!(a.record(1), original[1]);

        swap_particle_within(&mut a.particle_tile_data(), 1, 1);
        assert_eq!(a.record(1), original[1]);
    }
}
