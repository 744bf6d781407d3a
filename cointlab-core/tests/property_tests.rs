//! Property tests for the numeric building blocks.
//!
//! Uses proptest to verify:
//! 1. Differencing shortens a series by exactly its order
//! 2. Durbin–Watson stays within [0, 4]
//! 3. OLS residuals are orthogonal to the intercept
//! 4. Seeded generation is reproducible

use cointlab_core::domain::{difference, difference_n, is_degenerate};
use cointlab_core::stats::ols::{self, durbin_watson, CovarianceType};
use cointlab_core::{Scenario, SeedHierarchy, SyntheticGenerator};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_values(min_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1000.0..1000.0_f64, min_len..80)
}

// ── 1. Differencing ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn difference_n_drops_order_values(values in arb_values(1), order in 0usize..4) {
        let d = difference_n(&values, order);
        prop_assert_eq!(d.len(), values.len().saturating_sub(order));
    }

    #[test]
    fn first_difference_inverts_cumulative_sum(steps in arb_values(2)) {
        let mut level = 0.0;
        let walk: Vec<f64> = steps.iter().map(|s| { level += s; level }).collect();
        let d = difference(&walk);
        for (got, want) in d.iter().zip(&steps[1..]) {
            prop_assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn constant_series_is_degenerate(value in -1e6..1e6_f64, len in 2usize..50) {
        prop_assert!(is_degenerate(&vec![value; len], 1e-10));
    }
}

// ── 2. Durbin–Watson bounds ──────────────────────────────────────────

proptest! {
    #[test]
    fn durbin_watson_is_bounded(residuals in arb_values(2)) {
        let dw = durbin_watson(&residuals);
        if dw.is_finite() {
            prop_assert!((0.0..=4.0 + 1e-9).contains(&dw));
        }
    }
}

// ── 3. OLS residuals ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn residuals_sum_to_zero_with_intercept(seed in 0u64..500) {
        let mut g = SyntheticGenerator::new(seed);
        let x = g.white_noise(60, 1.0);
        let e = g.white_noise(60, 0.3);
        let y: Vec<f64> = x.iter().zip(&e).map(|(x, e)| 1.0 - 2.0 * x + e).collect();
        let fit = ols::fit(&y, &[&x], true, CovarianceType::NonRobust).unwrap();
        let total: f64 = fit.residuals.iter().sum();
        prop_assert!(total.abs() < 1e-8);
        prop_assert!(fit.r_squared > 0.0 && fit.r_squared <= 1.0);
    }
}

// ── 4. Reproducibility ───────────────────────────────────────────────

proptest! {
    #[test]
    fn scenarios_are_reproducible(seed in any::<u64>(), len in 10usize..120) {
        let a = Scenario::Mixed.generate(len, seed);
        let b = Scenario::Mixed.generate(len, seed);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn sub_seeds_differ_by_series(seed in any::<u64>()) {
        let h = SeedHierarchy::new(seed);
        prop_assert_ne!(h.sub_seed("gdp", 0), h.sub_seed("rainfall", 0));
    }
}
