//! Keep-mask flags and the exclusive prefix sum over them

use rayon::prelude::*;

/// Element type of a keep mask. Any nonzero value means keep.
pub trait MaskFlag: Copy + Send + Sync {
    fn is_set(self) -> bool;

    /// Contribution of this entry to the prefix sum (always 0 or 1)
    #[inline]
    fn flag(self) -> usize {
        usize::from(self.is_set())
    }
}

impl MaskFlag for bool {
    #[inline]
    fn is_set(self) -> bool {
        self
    }
}

macro_rules! impl_mask_flag {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MaskFlag for $ty {
                #[inline]
                fn is_set(self) -> bool {
                    self != 0
                }
            }
        )*
    };
}

impl_mask_flag!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Sequential exclusive scan, returns the total
pub(crate) fn exclusive_scan_serial<M: MaskFlag>(mask: &[M], offsets: &mut [usize]) -> usize {
    let mut running = 0usize;
    for (out, &m) in offsets.iter_mut().zip(mask) {
        *out = running;
        running += m.flag();
    }
    running
}

/// Two-pass chunked exclusive scan. Must run inside the pool it should use.
///
/// Pass one counts the kept entries of every chunk in parallel, the chunk
/// totals are scanned sequentially, pass two fills each chunk in parallel
/// starting from its base.
pub(crate) fn exclusive_scan_chunked<M: MaskFlag>(mask: &[M], offsets: &mut [usize], chunk_len: usize) {
    debug_assert_eq!(mask.len(), offsets.len());
    let chunk_len = chunk_len.max(1);

    let totals: Vec<usize> = mask
        .par_chunks(chunk_len)
        .map(|chunk| chunk.iter().filter(|m| m.is_set()).count())
        .collect();

    let mut bases = Vec::with_capacity(totals.len());
    let mut running = 0usize;
    for total in totals {
        bases.push(running);
        running += total;
    }

    offsets
        .par_chunks_mut(chunk_len)
        .zip(mask.par_chunks(chunk_len))
        .zip(bases.par_iter())
        .for_each(|((out, flags), &base)| {
            exclusive_scan_serial(flags, out);
            for value in out.iter_mut() {
                *value += base;
            }
        });
}
