//! Random streams for entity code.
//!
//! The engine itself never samples.  A model that wants a run to be
//! reproducible from `SimConfig::seed` gives every process its own
//! [`ProcessRng`], built from the seed and the process's id (both available
//! through the process context).  Streams are independent, so the order in
//! which processes happen to draw never changes what any of them sees, and
//! registering more processes leaves the existing streams untouched.

use rand::distributions::Distribution;
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ProcessId;

/// Fractional part of the golden ratio; spreads neighbouring process ids
/// across the seed space.
const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// The random stream owned by one process.
pub struct ProcessRng(SmallRng);

impl ProcessRng {
    pub fn new(run_seed: u64, process: ProcessId) -> Self {
        let mixed = u64::from(process.0).wrapping_add(1).wrapping_mul(GOLDEN_GAMMA);
        ProcessRng(SmallRng::seed_from_u64(run_seed ^ mixed))
    }

    /// Draw from `dist`, e.g. a `rand_distr::Normal` service time.
    #[inline]
    pub fn sample<T, D: Distribution<T>>(&mut self, dist: &D) -> T {
        dist.sample(&mut self.0)
    }

    /// Uniform draw from `range`.
    #[inline]
    pub fn gen_range<T: SampleUniform, R: SampleRange<T>>(&mut self, range: R) -> T {
        self.0.gen_range(range)
    }
}
