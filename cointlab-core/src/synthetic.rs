//! Seeded synthetic series for tests, benchmarks and the `generate` command.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::Series;
use crate::rng::SeedHierarchy;

/// Gaussian sample paths from a seeded `StdRng`.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_rng(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Box–Muller draw from N(0, 1).
    pub fn standard_normal(&mut self) -> f64 {
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    pub fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        mean + sd * self.standard_normal()
    }

    pub fn white_noise(&mut self, n: usize, sd: f64) -> Vec<f64> {
        (0..n).map(|_| self.normal(0.0, sd)).collect()
    }

    /// Cumulative sum of N(drift, sd²) steps.
    pub fn random_walk(&mut self, n: usize, sd: f64, drift: f64) -> Vec<f64> {
        let mut level = 0.0;
        (0..n)
            .map(|_| {
                level += self.normal(drift, sd);
                level
            })
            .collect()
    }

    /// Cumulative sum of a random walk.
    pub fn integrated_twice(&mut self, n: usize, sd: f64) -> Vec<f64> {
        let mut level = 0.0;
        self.random_walk(n, sd, 0.0)
            .into_iter()
            .map(|step| {
                level += step;
                level
            })
            .collect()
    }

    /// `x_t = phi x_{t-1} + e_t`, started at zero.
    pub fn ar1(&mut self, n: usize, phi: f64, sd: f64) -> Vec<f64> {
        let mut prev = 0.0;
        (0..n)
            .map(|_| {
                prev = phi * prev + self.normal(0.0, sd);
                prev
            })
            .collect()
    }

    /// `(x, y)` with `x` a random walk and `y = x + N(0, noise_sd²)`.
    pub fn cointegrated_pair(&mut self, n: usize, noise_sd: f64) -> (Vec<f64>, Vec<f64>) {
        let x = self.random_walk(n, 1.0, 0.0);
        let y = x.iter().map(|v| v + self.normal(0.0, noise_sd)).collect();
        (x, y)
    }

    /// White noise whose mean jumps by `shift` from index `at` onward.
    pub fn level_shift(&mut self, n: usize, at: usize, shift: f64, sd: f64) -> Vec<f64> {
        (0..n)
            .map(|t| {
                let base = if t >= at { shift } else { 0.0 };
                base + self.normal(0.0, sd)
            })
            .collect()
    }
}

/// Named multi-series datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Two independent white-noise series, one with a health-domain name.
    WhiteNoise,
    /// Two independent random walks.
    RandomWalk,
    /// A random walk and a noisy copy of it.
    Cointegrated,
    /// Two noise series sharing a mean shift halfway through.
    LevelShift,
    /// One stationary and one integrated series.
    Mixed,
}

impl Scenario {
    /// Generate the scenario's series; each series draws from its own sub-seed.
    pub fn generate(self, length: usize, seed: u64) -> Vec<Series> {
        let seeds = SeedHierarchy::new(seed);
        let stream = |name: &str| SyntheticGenerator::from_rng(seeds.rng_for(name, 0));
        match self {
            Scenario::WhiteNoise => vec![
                Series::new("t", stream("t").white_noise(length, 1.0)),
                Series::new("disease_rate", stream("disease_rate").white_noise(length, 1.0)),
            ],
            Scenario::RandomWalk => vec![
                Series::new("gdp", stream("gdp").random_walk(length, 1.0, 0.0)),
                Series::new("consumption", stream("consumption").random_walk(length, 1.0, 0.0)),
            ],
            Scenario::Cointegrated => {
                let (x, y) = stream("pair").cointegrated_pair(length, 0.5);
                vec![
                    Series::new("respiratory_disease_rate", y),
                    Series::new("temperature", x),
                ]
            }
            Scenario::LevelShift => {
                let at = length / 2;
                vec![
                    Series::new("mortality", stream("mortality").level_shift(length, at, 5.0, 1.0)),
                    Series::new("pm25", stream("pm25").level_shift(length, at, 5.0, 1.0)),
                ]
            }
            Scenario::Mixed => vec![
                Series::new("hospital_admissions", stream("hospital_admissions").random_walk(length, 1.0, 0.0)),
                Series::new("rainfall", stream("rainfall").white_noise(length, 1.0)),
            ],
        }
    }
}
