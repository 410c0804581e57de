use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Independent random stream handed to stochastic predicates.
///
/// Each candidate index gets its own generator seeded from `(seed, index)`,
/// so the decision for one record never depends on how the loop was split
/// across workers or on the decisions made for its neighbours.
pub struct RandomContext {
    rng: StdRng,
    index: usize,
}

impl RandomContext {
    /// Create the stream for one candidate index
    pub fn for_index(seed: u64, index: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(stream_seed(seed, index)),
            index,
        }
    }

    /// The candidate index this stream belongs to
    pub fn index(&self) -> usize {
        self.index
    }

    /// Uniform sample in [0, 1)
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// True with probability `p` (clamped to [0, 1])
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform() < p.clamp(0.0, 1.0)
    }
}

impl RngCore for RandomContext {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Mix the base seed with the index (splitmix64 finalizer)
fn stream_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed
        .wrapping_add((index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
