//! Gather and scatter
//!
//! Index lists are validated in full before the dispatch, so an out of range
//! entry never leads to a partial move.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::range::{check_destination, check_runtime_layout, check_source};
use crate::error::{TransformError, TransformResult};
use crate::particles::{Particle, ParticleTile};

/// Primitive integer usable as a particle index
pub trait ParticleIndex: Copy + Send + Sync {
    /// The index as `usize`, `None` if negative or not representable
    fn to_index(self) -> Option<usize>;

    /// Lossless widening used in diagnostics
    fn as_i128(self) -> i128;
}

macro_rules! impl_particle_index {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParticleIndex for $ty {
                #[inline]
                fn to_index(self) -> Option<usize> {
                    usize::try_from(self).ok()
                }

                #[inline]
                fn as_i128(self) -> i128 {
                    self as i128
                }
            }
        )*
    };
}

impl_particle_index!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Validate the first `n` entries of `inds` against `available` particles
fn resolve_indices<I: ParticleIndex>(inds: &[I], n: usize, available: usize) -> TransformResult<Vec<usize>> {
    if inds.len() < n {
        return Err(TransformError::IndexListLength {
            len: inds.len(),
            required: n,
        });
    }

    inds[..n]
        .iter()
        .enumerate()
        .map(|(position, &index)| match index.to_index() {
            Some(i) if i < available => Ok(i),
            _ => Err(TransformError::IndexOutOfRange {
                index: index.as_i128(),
                position,
                available,
            }),
        })
        .collect()
}

/// `dst[i] = src[inds[i]]` for `i` in `0..n`.
///
/// Repeated indices are allowed and duplicate the source record.
pub fn gather_particles<P, I, const NAR: usize, const NAI: usize>(
    dst: &mut ParticleTile<P, NAR, NAI>,
    src: &ParticleTile<P, NAR, NAI>,
    n: usize,
    inds: &[I],
) -> TransformResult<()>
where
    P: Particle,
    I: ParticleIndex,
{
    check_runtime_layout(dst, src)?;
    check_destination(0, n, dst.num_particles())?;
    let inds = resolve_indices(inds, n, src.num_particles())?;

    if n == 0 {
        return Ok(());
    }

    let executor = dst.executor().clone();
    let src_data = src.const_particle_tile_data();
    let dst_data = dst.particle_tile_data();
    let inds = &inds;

    executor.for_each_index(n, |i| {
        // SAFETY: `i < n <= num_particles(dst)` and each `i` is visited once.
        let mut slot = unsafe { dst_data.slot_unchecked(i) };
        slot.copy_from(&src_data, inds[i]);
    });

    log::debug!("[gather_particles] gathered {} particles", n);
    Ok(())
}

/// `dst[inds[i]] = src[i]` for `i` in `0..n`.
///
/// When several entries name the same destination exactly one of the
/// colliding records is written; which one is unspecified.
pub fn scatter_particles<P, I, const NAR: usize, const NAI: usize>(
    dst: &mut ParticleTile<P, NAR, NAI>,
    src: &ParticleTile<P, NAR, NAI>,
    n: usize,
    inds: &[I],
) -> TransformResult<()>
where
    P: Particle,
    I: ParticleIndex,
{
    check_runtime_layout(dst, src)?;
    check_source(0, n, src.num_particles())?;
    let inds = resolve_indices(inds, n, dst.num_particles())?;

    if n == 0 {
        return Ok(());
    }

    let executor = dst.executor().clone();
    let claimed: Vec<AtomicBool> = (0..dst.num_particles()).map(|_| AtomicBool::new(false)).collect();
    let collisions = AtomicUsize::new(0);
    let src_data = src.const_particle_tile_data();
    let dst_data = dst.particle_tile_data();
    let inds = &inds;

    executor.for_each_index(n, |i| {
        let target = inds[i];
        if claimed[target].swap(true, Ordering::AcqRel) {
            collisions.fetch_add(1, Ordering::Relaxed);
            return;
        }
        // SAFETY: `target` was validated and the claim flag admits a single
        // writer per destination slot.
        let mut slot = unsafe { dst_data.slot_unchecked(target) };
        slot.copy_from(&src_data, i);
    });

    let collisions = collisions.into_inner();
    if collisions > 0 {
        log::warn!(
            "[scatter_particles] {} of {} writes dropped on colliding destination indices",
            collisions,
            n
        );
    }
    log::debug!("[scatter_particles] scattered {} particles", n - collisions);
    Ok(())
}
