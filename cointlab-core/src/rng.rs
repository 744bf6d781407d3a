//! Deterministic seed hierarchy for synthetic data.
//!
//! A master seed expands into one sub-seed per `(series name, replicate)`
//! through BLAKE3, so each series gets an independent stream that does not
//! depend on the order in which series are generated.

use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for one named series and replicate index.
    pub fn sub_seed(&self, series: &str, replicate: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(series.as_bytes());
        hasher.update(&replicate.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, series: &str, replicate: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(series, replicate))
    }
}
