//! Deterministic pseudo-noise for unit tests that must not depend on an RNG crate version.

/// Centred uniform noise on `[-0.5, 0.5)` from a 64-bit LCG.
pub fn lcg_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        })
        .collect()
}

/// Running sum of [`lcg_noise`], optionally with drift.
pub fn lcg_walk(n: usize, seed: u64, drift: f64) -> Vec<f64> {
    let mut level = 0.0;
    lcg_noise(n, seed)
        .into_iter()
        .map(|e| {
            level += e + drift;
            level
        })
        .collect()
}
