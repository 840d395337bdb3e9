//! Random sources for generation calls.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Hands out one RNG per generation call
///
/// Unseeded sources draw every RNG from entropy. A seeded source derives
/// the RNG of its k-th call from `seed + k`, so a freshly built instance
/// replays the same sequence of fixtures while consecutive calls still see
/// independent draws.
#[derive(Debug)]
pub struct RngSource {
    seed: Option<u64>,
    calls: AtomicU64,
}

impl RngSource {
    /// Seeded source for `Some`, entropy otherwise
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            calls: AtomicU64::new(0),
        }
    }

    /// Create a random source seeded from entropy
    pub fn from_entropy() -> Self {
        Self::new(None)
    }

    /// Create a reproducible random source
    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Seed of the source, if any
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// RNG for the next generation call
    pub fn next_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => {
                let call = self.calls.fetch_add(1, Ordering::Relaxed);
                StdRng::seed_from_u64(seed.wrapping_add(call))
            }
            None => StdRng::from_entropy(),
        }
    }
}

impl Clone for RngSource {
    /// The clone restarts the sequence of the seed
    fn clone(&self) -> Self {
        Self::new(self.seed)
    }
}
