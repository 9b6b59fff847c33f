//! Injectable randomness for execution simulation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Source of the two draws the simulator needs.
pub trait RandomSource: Send {
    /// Uniform draw in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Normal draw with the given mean and standard deviation.
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64;
}

/// `StdRng`-backed source. Identical seeds give identical draw sequences.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded if `seed` is given, otherwise from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + std_dev * z
    }
}
