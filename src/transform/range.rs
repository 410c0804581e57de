use crate::error::{destination_range, source_range, TransformError, TransformResult};
use crate::particles::{Particle, ParticleTile};

/// Index ranges of a single-destination transfer:
/// source `src_start..src_start + len` maps onto destination
/// `dst_start..dst_start + len`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferRange {
    pub src_start: usize,
    pub dst_start: usize,
    pub len: usize,
}

impl TransferRange {
    pub fn new(src_start: usize, dst_start: usize, len: usize) -> Self {
        Self {
            src_start,
            dst_start,
            len,
        }
    }

    /// `len` records starting at index 0 on both sides
    pub fn whole(len: usize) -> Self {
        Self::new(0, 0, len)
    }
}

/// Index ranges of a transfer writing two destinations at once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DualTransferRange {
    pub src_start: usize,
    pub dst1_start: usize,
    pub dst2_start: usize,
    pub len: usize,
}

impl DualTransferRange {
    pub fn new(src_start: usize, dst1_start: usize, dst2_start: usize, len: usize) -> Self {
        Self {
            src_start,
            dst1_start,
            dst2_start,
            len,
        }
    }

    pub fn whole(len: usize) -> Self {
        Self::new(0, 0, 0, len)
    }
}

/// End of `start..start + len`, rejecting overflow
pub(crate) fn checked_end(start: usize, len: usize) -> TransformResult<usize> {
    start
        .checked_add(len)
        .ok_or(TransformError::RangeOverflow { start, len })
}

/// `start..start + len` must lie inside a source of `available` particles
pub(crate) fn check_source(start: usize, len: usize, available: usize) -> TransformResult<()> {
    if checked_end(start, len)? > available {
        return Err(source_range(start, len, available));
    }
    Ok(())
}

/// `start..start + len` must lie inside a destination of `available` particles
pub(crate) fn check_destination(start: usize, len: usize, available: usize) -> TransformResult<()> {
    if checked_end(start, len)? > available {
        return Err(destination_range(start, len, available));
    }
    Ok(())
}

/// Record copies need identical runtime attribute layouts on both sides
pub(crate) fn check_runtime_layout<P: Particle, const NAR: usize, const NAI: usize>(
    dst: &ParticleTile<P, NAR, NAI>,
    src: &ParticleTile<P, NAR, NAI>,
) -> TransformResult<()> {
    if dst.num_runtime_real() != src.num_runtime_real() || dst.num_runtime_int() != src.num_runtime_int() {
        return Err(TransformError::RuntimeAttributeMismatch {
            dst_real: dst.num_runtime_real(),
            dst_int: dst.num_runtime_int(),
            src_real: src.num_runtime_real(),
            src_int: src.num_runtime_int(),
        });
    }
    Ok(())
}

/// The mask must provide at least `required` entries
pub(crate) fn check_mask(len: usize, required: usize) -> TransformResult<()> {
    if len < required {
        return Err(TransformError::MaskLength { len, required });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_and_destination_bounds() {
        assert!(check_source(2, 3, 5).is_ok());
        assert!(check_source(5, 0, 5).is_ok());
        assert!(matches!(
            check_source(3, 3, 5),
            Err(TransformError::SourceRange { start: 3, end: 6, available: 5 })
        ));
        assert!(matches!(
            check_destination(0, 4, 3),
            Err(TransformError::DestinationRange { end: 4, .. })
        ));
    }

    #[test]
    fn test_overflowing_range_is_rejected() {
        assert!(matches!(
            check_source(usize::MAX, 1, 10),
            Err(TransformError::RangeOverflow { start: usize::MAX, len: 1 })
        ));
    }

    #[test]
    fn test_mask_length() {
        assert!(check_mask(4, 4).is_ok());
        assert!(matches!(check_mask(3, 4), Err(TransformError::MaskLength { len: 3, required: 4 })));
    }

    #[test]
    fn test_whole_ranges_start_at_zero() {
        assert_eq!(TransferRange::whole(7), TransferRange::new(0, 0, 7));
        assert_eq!(DualTransferRange::whole(2).dst2_start, 0);
    }
}
