//! Seeded randomness for synthetic datasets.

use std::hash::Hasher;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use siphasher::sip::SipHasher13;

/// Reproducible source of uniform draws.
///
/// Child streams are seeded with SipHash-1-3 under zero keys, so a
/// `(seed, label)` pair yields the same numbers on every platform.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Stream seeded directly with `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Child stream number `substream` of `seed`.
    pub fn substream(seed: u64, substream: u64) -> Self {
        Self::from_seed(derive_substream_seed(seed, substream))
    }

    /// Child stream of `seed` keyed by a dataset name.
    pub fn for_dataset(seed: u64, dataset: &str) -> Self {
        let mut hasher = SipHasher13::new_with_keys(0, 0);
        hasher.write(dataset.as_bytes());
        Self::substream(seed, hasher.finish())
    }

    /// Uniform draw in `[lo, hi)`; returns `lo` for an empty interval.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// `count` uniform draws in `[lo, hi)`.
    pub fn uniform_vec(&mut self, count: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..count).map(|_| self.uniform(lo, hi)).collect()
    }
}

/// Seed of child stream `substream` of `master_seed`.
pub fn derive_substream_seed(master_seed: u64, substream: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(substream);
    hasher.finish()
}
