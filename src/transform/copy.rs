//! Bulk copy and transform
//!
//! Index `k` of the loop reads source `src_start + k` and writes destination
//! `dst_start + k`, so iterations never share a destination slot.
//!
//! Copies move whole records and need one tile type on both sides. Transforms
//! take independent source and destination layouts, so a callback may remap
//! attributes into a tile with a different payload or column set.

use super::range::{check_destination, check_runtime_layout, check_source, DualTransferRange, TransferRange};
use crate::error::TransformResult;
use crate::particles::{ConstParticleTileData, Particle, ParticleSlot, ParticleTile};

/// Copy every particle of `src` to the front of `dst`
pub fn copy_particles<P: Particle, const NAR: usize, const NAI: usize>(
    dst: &mut ParticleTile<P, NAR, NAI>,
    src: &ParticleTile<P, NAR, NAI>,
) -> TransformResult<()> {
    copy_particles_range(dst, src, TransferRange::whole(src.num_particles()))
}

/// Copy `range.len` particles from `range.src_start` to `range.dst_start`
pub fn copy_particles_range<P: Particle, const NAR: usize, const NAI: usize>(
    dst: &mut ParticleTile<P, NAR, NAI>,
    src: &ParticleTile<P, NAR, NAI>,
    range: TransferRange,
) -> TransformResult<()> {
    check_runtime_layout(dst, src)?;
    dispatch("copy_particles", dst, src, range, |slot, src, src_i| {
        slot.copy_from(src, src_i)
    })
}

/// Apply `f` to every particle of `src`, writing to the front of `dst`.
///
/// `f(slot, src, src_i)` receives the destination slot (its index is
/// `slot.index()`), the source view and the source index. It may write any
/// subset of the slot's columns. Runtime layouts are not compared; a callback
/// that calls [`ParticleSlot::copy_from`] across mismatched layouts panics
/// mid-pass.
pub fn transform_particles<PD, PS, F, const NARD: usize, const NAID: usize, const NARS: usize, const NAIS: usize>(
    dst: &mut ParticleTile<PD, NARD, NAID>,
    src: &ParticleTile<PS, NARS, NAIS>,
    f: F,
) -> TransformResult<()>
where
    PD: Particle,
    PS: Particle,
    F: Fn(&mut ParticleSlot<'_, '_, PD, NARD, NAID>, &ConstParticleTileData<'_, PS, NARS, NAIS>, usize) + Sync,
{
    transform_particles_range(dst, src, TransferRange::whole(src.num_particles()), f)
}

/// Apply `f` to `range.len` particles starting at `range.src_start`,
/// writing from `range.dst_start`
pub fn transform_particles_range<
    PD,
    PS,
    F,
    const NARD: usize,
    const NAID: usize,
    const NARS: usize,
    const NAIS: usize,
>(
    dst: &mut ParticleTile<PD, NARD, NAID>,
    src: &ParticleTile<PS, NARS, NAIS>,
    range: TransferRange,
    f: F,
) -> TransformResult<()>
where
    PD: Particle,
    PS: Particle,
    F: Fn(&mut ParticleSlot<'_, '_, PD, NARD, NAID>, &ConstParticleTileData<'_, PS, NARS, NAIS>, usize) + Sync,
{
    dispatch("transform_particles", dst, src, range, f)
}

/// Apply `f` to every particle of `src`, writing to the front of both
/// `dst1` and `dst2`. The three tiles may all have different layouts.
pub fn transform_particles_dual<
    PD1,
    PD2,
    PS,
    F,
    const NARD1: usize,
    const NAID1: usize,
    const NARD2: usize,
    const NAID2: usize,
    const NARS: usize,
    const NAIS: usize,
>(
    dst1: &mut ParticleTile<PD1, NARD1, NAID1>,
    dst2: &mut ParticleTile<PD2, NARD2, NAID2>,
    src: &ParticleTile<PS, NARS, NAIS>,
    f: F,
) -> TransformResult<()>
where
    PD1: Particle,
    PD2: Particle,
    PS: Particle,
    F: Fn(
            &mut ParticleSlot<'_, '_, PD1, NARD1, NAID1>,
            &mut ParticleSlot<'_, '_, PD2, NARD2, NAID2>,
            &ConstParticleTileData<'_, PS, NARS, NAIS>,
            usize,
        ) + Sync,
{
    transform_particles_dual_range(dst1, dst2, src, DualTransferRange::whole(src.num_particles()), f)
}

/// Apply `f` to `range.len` particles starting at `range.src_start`, writing
/// `dst1` from `range.dst1_start` and `dst2` from `range.dst2_start`
pub fn transform_particles_dual_range<
    PD1,
    PD2,
    PS,
    F,
    const NARD1: usize,
    const NAID1: usize,
    const NARD2: usize,
    const NAID2: usize,
    const NARS: usize,
    const NAIS: usize,
>(
    dst1: &mut ParticleTile<PD1, NARD1, NAID1>,
    dst2: &mut ParticleTile<PD2, NARD2, NAID2>,
    src: &ParticleTile<PS, NARS, NAIS>,
    range: DualTransferRange,
    f: F,
) -> TransformResult<()>
where
    PD1: Particle,
    PD2: Particle,
    PS: Particle,
    F: Fn(
            &mut ParticleSlot<'_, '_, PD1, NARD1, NAID1>,
            &mut ParticleSlot<'_, '_, PD2, NARD2, NAID2>,
            &ConstParticleTileData<'_, PS, NARS, NAIS>,
            usize,
        ) + Sync,
{
    check_source(range.src_start, range.len, src.num_particles())?;
    check_destination(range.dst1_start, range.len, dst1.num_particles())?;
    check_destination(range.dst2_start, range.len, dst2.num_particles())?;

    if range.len == 0 {
        return Ok(());
    }

    let executor = dst1.executor().clone();
    let src_data = src.const_particle_tile_data();
    let dst1_data = dst1.particle_tile_data();
    let dst2_data = dst2.particle_tile_data();

    executor.for_each_index(range.len, |k| {
        // SAFETY: both destination ranges were checked above and `k` is
        // unique to this iteration, so each slot index is touched once.
        let (mut slot1, mut slot2) = unsafe {
            (
                dst1_data.slot_unchecked(range.dst1_start + k),
                dst2_data.slot_unchecked(range.dst2_start + k),
            )
        };
        f(&mut slot1, &mut slot2, &src_data, range.src_start + k);
    });

    log::debug!("[transform_particles_dual] wrote {} particle pairs", range.len);
    Ok(())
}

/// Shared body of every single-destination copy and transform
fn dispatch<PD, PS, F, const NARD: usize, const NAID: usize, const NARS: usize, const NAIS: usize>(
    op: &str,
    dst: &mut ParticleTile<PD, NARD, NAID>,
    src: &ParticleTile<PS, NARS, NAIS>,
    range: TransferRange,
    f: F,
) -> TransformResult<()>
where
    PD: Particle,
    PS: Particle,
    F: Fn(&mut ParticleSlot<'_, '_, PD, NARD, NAID>, &ConstParticleTileData<'_, PS, NARS, NAIS>, usize) + Sync,
{
    check_source(range.src_start, range.len, src.num_particles())?;
    check_destination(range.dst_start, range.len, dst.num_particles())?;

    if range.len == 0 {
        return Ok(());
    }

    let executor = dst.executor().clone();
    let src_data = src.const_particle_tile_data();
    let dst_data = dst.particle_tile_data();

    executor.for_each_index(range.len, |k| {
        // SAFETY: the destination range was checked above and `k` is unique
        // to this iteration.
        let mut slot = unsafe { dst_data.slot_unchecked(range.dst_start + k) };
        f(&mut slot, &src_data, range.src_start + k);
    });

    log::debug!(
        "[{}] {} particles from {} to {}",
        op,
        range.len,
        range.src_start,
        range.dst_start
    );
    Ok(())
}
