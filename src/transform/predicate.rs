//! Keep rules for predicate-driven compaction
//!
//! A rule turns a slice of source candidates into a 0/1 keep mask. The two
//! rule kinds are separate named types so the call site states whether the
//! decision is deterministic or randomized.

use crate::exec::{Executor, RandomContext};
use crate::particles::{ConstParticleTileData, Particle};

/// Evaluates keep decisions for the candidates `src_start..src_start + n`
pub trait KeepRule<P, const NAR: usize, const NAI: usize>: Sync {
    /// Build a mask of length `n`; entry `k` decides source index `src_start + k`
    fn build_mask(
        &self,
        executor: &Executor,
        src: &ConstParticleTileData<'_, P, NAR, NAI>,
        src_start: usize,
        n: usize,
    ) -> Vec<u8>;
}

/// Deterministic rule: `f(src, index) -> keep`
#[derive(Debug, Clone, Copy)]
pub struct Predicate<F>(pub F);

impl<P, F, const NAR: usize, const NAI: usize> KeepRule<P, NAR, NAI> for Predicate<F>
where
    P: Particle,
    F: Fn(&ConstParticleTileData<'_, P, NAR, NAI>, usize) -> bool + Sync,
{
    fn build_mask(
        &self,
        executor: &Executor,
        src: &ConstParticleTileData<'_, P, NAR, NAI>,
        src_start: usize,
        n: usize,
    ) -> Vec<u8> {
        executor.build_mask(n, |k| (self.0)(src, src_start + k))
    }
}

/// Randomized rule: `f(src, index, rng) -> keep`.
///
/// Each source index draws from its own stream derived from the rule's seed
/// and the index, so results are reproducible for a fixed seed and do not
/// depend on how the loop is scheduled.
#[derive(Debug, Clone, Copy)]
pub struct StochasticPredicate<F> {
    seed: u64,
    keep: F,
}

impl<F> StochasticPredicate<F> {
    pub fn new(seed: u64, keep: F) -> Self {
        Self { seed, keep }
    }

    /// Seed from the thread-local entropy source
    pub fn from_entropy(keep: F) -> Self {
        Self::new(rand::random(), keep)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl<P, F, const NAR: usize, const NAI: usize> KeepRule<P, NAR, NAI> for StochasticPredicate<F>
where
    P: Particle,
    F: Fn(&ConstParticleTileData<'_, P, NAR, NAI>, usize, &mut RandomContext) -> bool + Sync,
{
    fn build_mask(
        &self,
        executor: &Executor,
        src: &ConstParticleTileData<'_, P, NAR, NAI>,
        src_start: usize,
        n: usize,
    ) -> Vec<u8> {
        executor.build_mask(n, |k| {
            let index = src_start + k;
            let mut rng = RandomContext::for_index(self.seed, index);
            (self.keep)(src, index, &mut rng)
        })
    }
}
