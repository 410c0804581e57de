//! Stream compaction
//!
//! Every variant reduces to the same mask-driven core:
//! 1. exclusive prefix sum of the keep mask gives each kept candidate its
//!    rank among the kept candidates before it
//! 2. the selected count is read back once, after the scan has completed,
//!    and checked against the destination extent
//! 3. one parallel pass writes kept candidate `k` to `dst_start + offsets[k]`
//!
//! Ranks are strictly increasing over kept candidates, so the compacting pass
//! writes the dense range `dst_start..dst_start + count` in source order.

use super::predicate::KeepRule;
use super::range::{check_destination, check_mask, check_runtime_layout, check_source, TransferRange};
use crate::error::TransformResult;
use crate::exec::MaskFlag;
use crate::particles::{ConstParticleTileData, Particle, ParticleSlot, ParticleTile};

/// Copy the particles of `src` whose mask entry is nonzero to the front of
/// `dst`. Returns the number of particles written.
pub fn filter_particles<P, M, const NAR: usize, const NAI: usize>(
    dst: &mut ParticleTile<P, NAR, NAI>,
    src: &ParticleTile<P, NAR, NAI>,
    mask: &[M],
) -> TransformResult<usize>
where
    P: Particle,
    M: MaskFlag,
{
    filter_particles_range(dst, src, mask, TransferRange::whole(src.num_particles()))
}

/// Compact `range.len` candidates starting at `range.src_start` into `dst`
/// from `range.dst_start`. `mask[k]` decides source index `range.src_start + k`.
pub fn filter_particles_range<P, M, const NAR: usize, const NAI: usize>(
    dst: &mut ParticleTile<P, NAR, NAI>,
    src: &ParticleTile<P, NAR, NAI>,
    mask: &[M],
    range: TransferRange,
) -> TransformResult<usize>
where
    P: Particle,
    M: MaskFlag,
{
    check_runtime_layout(dst, src)?;
    check_mask(mask.len(), range.len)?;
    compact(
        "filter_particles",
        dst,
        src,
        &mask[..range.len],
        range.src_start,
        range.dst_start,
        |slot, src, src_i| slot.copy_from(src, src_i),
    )
}

/// Copy the particles of `src` accepted by `rule` to the front of `dst`
pub fn filter_particles_where<P, R, const NAR: usize, const NAI: usize>(
    dst: &mut ParticleTile<P, NAR, NAI>,
    src: &ParticleTile<P, NAR, NAI>,
    rule: &R,
) -> TransformResult<usize>
where
    P: Particle,
    R: KeepRule<P, NAR, NAI>,
{
    filter_particles_where_range(dst, src, rule, TransferRange::whole(src.num_particles()))
}

/// Predicate-driven [`filter_particles_range`]
pub fn filter_particles_where_range<P, R, const NAR: usize, const NAI: usize>(
    dst: &mut ParticleTile<P, NAR, NAI>,
    src: &ParticleTile<P, NAR, NAI>,
    rule: &R,
    range: TransferRange,
) -> TransformResult<usize>
where
    P: Particle,
    R: KeepRule<P, NAR, NAI>,
{
    check_runtime_layout(dst, src)?;
    check_source(range.src_start, range.len, src.num_particles())?;
    let mask = rule.build_mask(
        dst.executor(),
        &src.const_particle_tile_data(),
        range.src_start,
        range.len,
    );
    filter_particles_range(dst, src, &mask, range)
}

/// Compact the particles of `src` selected by `mask` into the front of `dst`,
/// writing each through `f(slot, src, src_i)` instead of a plain copy.
///
/// `dst` and `src` may have different layouts, so runtime attribute counts
/// are not compared up front. A callback that calls
/// [`ParticleSlot::copy_from`] across mismatched layouts panics during the
/// compacting pass, leaving `dst` partially written; use [`filter_particles`]
/// for whole-record copies.
pub fn filter_and_transform_particles<
    PD,
    PS,
    M,
    F,
    const NARD: usize,
    const NAID: usize,
    const NARS: usize,
    const NAIS: usize,
>(
    dst: &mut ParticleTile<PD, NARD, NAID>,
    src: &ParticleTile<PS, NARS, NAIS>,
    mask: &[M],
    f: F,
) -> TransformResult<usize>
where
    PD: Particle,
    PS: Particle,
    M: MaskFlag,
    F: Fn(&mut ParticleSlot<'_, '_, PD, NARD, NAID>, &ConstParticleTileData<'_, PS, NARS, NAIS>, usize) + Sync,
{
    filter_and_transform_particles_at(dst, src, mask, f, 0, 0)
}

/// Filter and transform the candidates `src_start..num_particles(src)`,
/// writing from `dst_start`.
///
/// `mask` is indexed by absolute source index and must cover the whole
/// source tile. Entries before `src_start` are ignored: they contribute
/// neither to the destination offsets nor to the returned count, so kept
/// candidate `src_start + k` lands at `dst_start` plus the number of kept
/// entries in `mask[src_start..src_start + k]`.
///
/// Layouts are not compared; see [`filter_and_transform_particles`].
pub fn filter_and_transform_particles_at<
    PD,
    PS,
    M,
    F,
    const NARD: usize,
    const NAID: usize,
    const NARS: usize,
    const NAIS: usize,
>(
    dst: &mut ParticleTile<PD, NARD, NAID>,
    src: &ParticleTile<PS, NARS, NAIS>,
    mask: &[M],
    f: F,
    src_start: usize,
    dst_start: usize,
) -> TransformResult<usize>
where
    PD: Particle,
    PS: Particle,
    M: MaskFlag,
    F: Fn(&mut ParticleSlot<'_, '_, PD, NARD, NAID>, &ConstParticleTileData<'_, PS, NARS, NAIS>, usize) + Sync,
{
    let np = src.num_particles();
    check_source(src_start, 0, np)?;
    check_mask(mask.len(), np)?;
    compact(
        "filter_and_transform_particles",
        dst,
        src,
        &mask[src_start..np],
        src_start,
        dst_start,
        f,
    )
}

/// Predicate-driven [`filter_and_transform_particles`]. The rule reads the
/// source layout.
pub fn filter_and_transform_particles_where<
    PD,
    PS,
    R,
    F,
    const NARD: usize,
    const NAID: usize,
    const NARS: usize,
    const NAIS: usize,
>(
    dst: &mut ParticleTile<PD, NARD, NAID>,
    src: &ParticleTile<PS, NARS, NAIS>,
    rule: &R,
    f: F,
) -> TransformResult<usize>
where
    PD: Particle,
    PS: Particle,
    R: KeepRule<PS, NARS, NAIS>,
    F: Fn(&mut ParticleSlot<'_, '_, PD, NARD, NAID>, &ConstParticleTileData<'_, PS, NARS, NAIS>, usize) + Sync,
{
    filter_and_transform_particles_where_at(dst, src, rule, f, 0, 0)
}

/// Predicate-driven [`filter_and_transform_particles_at`]. Only the
/// candidates `src_start..num_particles(src)` are evaluated.
pub fn filter_and_transform_particles_where_at<
    PD,
    PS,
    R,
    F,
    const NARD: usize,
    const NAID: usize,
    const NARS: usize,
    const NAIS: usize,
>(
    dst: &mut ParticleTile<PD, NARD, NAID>,
    src: &ParticleTile<PS, NARS, NAIS>,
    rule: &R,
    f: F,
    src_start: usize,
    dst_start: usize,
) -> TransformResult<usize>
where
    PD: Particle,
    PS: Particle,
    R: KeepRule<PS, NARS, NAIS>,
    F: Fn(&mut ParticleSlot<'_, '_, PD, NARD, NAID>, &ConstParticleTileData<'_, PS, NARS, NAIS>, usize) + Sync,
{
    let np = src.num_particles();
    check_source(src_start, 0, np)?;
    let mask = rule.build_mask(
        dst.executor(),
        &src.const_particle_tile_data(),
        src_start,
        np - src_start,
    );
    compact(
        "filter_and_transform_particles",
        dst,
        src,
        &mask,
        src_start,
        dst_start,
        f,
    )
}

/// Compact the particles of `src` selected by `mask` into both `dst1` and
/// `dst2`. A kept particle lands at the same offset in both destinations:
/// `f(slot1, slot2, src, src_i)` with `slot1.index() == slot2.index()`.
///
/// The three tiles may have different layouts. As with
/// [`filter_and_transform_particles`], layout mismatches hit by the callback
/// panic mid-pass rather than returning an error.
pub fn filter_and_transform_particles_dual<
    PD1,
    PD2,
    PS,
    M,
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
    mask: &[M],
    f: F,
) -> TransformResult<usize>
where
    PD1: Particle,
    PD2: Particle,
    PS: Particle,
    M: MaskFlag,
    F: Fn(
            &mut ParticleSlot<'_, '_, PD1, NARD1, NAID1>,
            &mut ParticleSlot<'_, '_, PD2, NARD2, NAID2>,
            &ConstParticleTileData<'_, PS, NARS, NAIS>,
            usize,
        ) + Sync,
{
    let np = src.num_particles();
    check_mask(mask.len(), np)?;
    let mask = &mask[..np];

    if np == 0 {
        return Ok(0);
    }

    let executor = dst1.executor().clone();
    let offsets = executor.exclusive_scan(mask);
    let count = executor.read_back_count(mask, &offsets);
    check_destination(0, count, dst1.num_particles())?;
    check_destination(0, count, dst2.num_particles())?;

    if count > 0 {
        let src_data = src.const_particle_tile_data();
        let dst1_data = dst1.particle_tile_data();
        let dst2_data = dst2.particle_tile_data();
        let offsets = &offsets;

        executor.for_each_index(np, |i| {
            if mask[i].is_set() {
                // SAFETY: kept candidates have strictly increasing offsets
                // below `count`, which fits both destinations.
                let (mut slot1, mut slot2) =
                    unsafe { (dst1_data.slot_unchecked(offsets[i]), dst2_data.slot_unchecked(offsets[i])) };
                f(&mut slot1, &mut slot2, &src_data, i);
            }
        });
    }

    log::debug!(
        "[filter_and_transform_particles_dual] kept {} of {} particles",
        count,
        np
    );
    Ok(count)
}

/// Predicate-driven [`filter_and_transform_particles_dual`]
pub fn filter_and_transform_particles_dual_where<
    PD1,
    PD2,
    PS,
    R,
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
    rule: &R,
    f: F,
) -> TransformResult<usize>
where
    PD1: Particle,
    PD2: Particle,
    PS: Particle,
    R: KeepRule<PS, NARS, NAIS>,
    F: Fn(
            &mut ParticleSlot<'_, '_, PD1, NARD1, NAID1>,
            &mut ParticleSlot<'_, '_, PD2, NARD2, NAID2>,
            &ConstParticleTileData<'_, PS, NARS, NAIS>,
            usize,
        ) + Sync,
{
    let mask = rule.build_mask(
        dst1.executor(),
        &src.const_particle_tile_data(),
        0,
        src.num_particles(),
    );
    filter_and_transform_particles_dual(dst1, dst2, src, &mask, f)
}

/// Mask-driven core shared by the single-destination variants.
///
/// `mask[k]` decides source index `src_start + k`.
fn compact<PD, PS, M, F, const NARD: usize, const NAID: usize, const NARS: usize, const NAIS: usize>(
    op: &str,
    dst: &mut ParticleTile<PD, NARD, NAID>,
    src: &ParticleTile<PS, NARS, NAIS>,
    mask: &[M],
    src_start: usize,
    dst_start: usize,
    f: F,
) -> TransformResult<usize>
where
    PD: Particle,
    PS: Particle,
    M: MaskFlag,
    F: Fn(&mut ParticleSlot<'_, '_, PD, NARD, NAID>, &ConstParticleTileData<'_, PS, NARS, NAIS>, usize) + Sync,
{
    let n = mask.len();
    check_source(src_start, n, src.num_particles())?;

    if n == 0 {
        log::debug!("[{}] no candidates", op);
        return Ok(0);
    }

    let executor = dst.executor().clone();
    let offsets = executor.exclusive_scan(mask);
    let count = executor.read_back_count(mask, &offsets);
    check_destination(dst_start, count, dst.num_particles())?;

    if count > 0 {
        let src_data = src.const_particle_tile_data();
        let dst_data = dst.particle_tile_data();
        let offsets = &offsets;

        executor.for_each_index(n, |k| {
            if mask[k].is_set() {
                // SAFETY: kept candidates have strictly increasing offsets
                // below `count`, and `dst_start + count` fits the destination.
                let mut slot = unsafe { dst_data.slot_unchecked(dst_start + offsets[k]) };
                f(&mut slot, &src_data, src_start + k);
            }
        });
    }

    log::debug!("[{}] kept {} of {} particles", op, count, n);
    Ok(count)
}
